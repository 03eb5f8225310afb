//! Art director agent: turns the finished copy into a promotional image.

use std::sync::Arc;

use crate::image::ImageGenerator;
use crate::state::{Agent, CampaignState, LogEntry, Outcome, StateDelta};
use crate::truncate_chars;

/// Characters of the service error kept in the placeholder reference.
const PLACEHOLDER_ERROR_CHARS: usize = 40;

/// Prompt for the product shot: the brief plus a fixed studio style.
pub fn image_prompt(brief: &str) -> String {
    format!(
        "Professional product photography and marketing design. \
         Product: {brief}. \
         Style: High-quality, clean background, vibrant colors, modern marketing aesthetic. \
         Resolution: 4K, studio lighting, professional product shot."
    )
}

/// Reference stored when the image service fails.
pub fn placeholder_reference(error: &str) -> String {
    format!(
        "[Image generation unavailable: {}...]",
        truncate_chars(error, PLACEHOLDER_ERROR_CHARS)
    )
}

pub struct ArtDirector {
    images: Arc<dyn ImageGenerator>,
}

impl ArtDirector {
    pub fn new(images: Arc<dyn ImageGenerator>) -> Self {
        Self { images }
    }

    /// Produce the campaign image. Never fails: service errors become a
    /// placeholder reference logged as `ERROR`.
    pub async fn produce(&self, state: &CampaignState) -> StateDelta {
        let iteration = state.iteration_count() + 1;
        let prompt = image_prompt(state.input_brief());

        tracing::info!(
            approved = state.approved_text().is_some(),
            copy_chars = state.approved_text().unwrap_or(state.draft()).chars().count(),
            "Generating promotional image"
        );

        let (reference, outcome) = match self.images.generate(&prompt).await {
            Ok(reference) => (reference, Outcome::Success),
            Err(e) => {
                let error = format!("{e:#}");
                tracing::error!(%error, "Image generation failed");
                (placeholder_reference(&error), Outcome::Error)
            }
        };

        let log = LogEntry::new(
            Agent::ArtDirector,
            "image_generation",
            &reference,
            outcome,
            iteration,
        );
        StateDelta::asset(reference, log)
    }
}
