//! Copywriter agent.
//!
//! Drafts ad copy from the brief, or revises it against the single most
//! recent rejection. Earlier feedback is audit history only and is never
//! passed back to the model.

use std::sync::Arc;

use crate::llm::{GenerationRequest, RoleProfile, TextGenerator};
use crate::reviewer::{Category, Verdict};
use crate::state::{Agent, CampaignState, LogEntry, Outcome, StateDelta};
use crate::truncate_chars;

const WRITER_SYSTEM: &str = r#"You are an exceptional copywriter specializing in social media advertising.
Your task is to create compelling, energetic, 2-3 line ad copy that:
- Captures attention immediately
- Is specific about product benefits (no vague claims)
- Uses engaging language with emojis
- Is platform-ready (Twitter/Instagram length)
- Avoids unverified claims like "100%", "guaranteed", "miracle"

Write ONLY the ad copy, no explanations."#;

/// Characters of the brief used in fallback templates.
const TEMPLATE_PRODUCT_CHARS: usize = 40;

/// Number of distinct revision templates.
const REVISION_TEMPLATES: usize = 4;

/// The copywriter agent.
pub struct Writer {
    llm: Arc<dyn TextGenerator>,
    profile: RoleProfile,
}

impl Writer {
    pub fn new(llm: Arc<dyn TextGenerator>, profile: RoleProfile) -> Self {
        Self { llm, profile }
    }

    /// Produce a new draft and return the delta for it.
    pub async fn draft(&self, state: &CampaignState) -> StateDelta {
        let attempt = state.attempt_count() + 1;
        let iteration = state.iteration_count() + 1;
        let feedback = pending_feedback(state);
        let content = user_content(state.input_brief(), feedback.as_ref());

        if feedback.is_some() {
            tracing::info!(attempt, "Incorporating reviewer feedback");
        }

        let request = GenerationRequest {
            system: WRITER_SYSTEM,
            content: &content,
            temperature: self.profile.temperature,
            max_tokens: self.profile.max_tokens,
        };

        let (draft, outcome) = match self.llm.generate(request).await {
            Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), Outcome::Success),
            Ok(_) => {
                tracing::warn!(attempt, "Writer returned an empty draft, using template");
                let draft = fallback_draft(state.input_brief(), feedback.as_ref(), state.draft());
                (draft, Outcome::Degraded)
            }
            Err(e) => {
                tracing::warn!(attempt, error = %format!("{e:#}"), "Writer unavailable, using template");
                let draft = fallback_draft(state.input_brief(), feedback.as_ref(), state.draft());
                (draft, Outcome::Degraded)
            }
        };

        tracing::info!(
            attempt,
            chars = draft.chars().count(),
            %outcome,
            "Draft generated"
        );

        let log = LogEntry::new(Agent::Writer, "copy_generation", &draft, outcome, iteration);
        StateDelta::draft(draft, log)
    }
}

/// The latest verdict, if it asks for a revision.
fn pending_feedback(state: &CampaignState) -> Option<Verdict> {
    state.latest_verdict().filter(|v| !v.is_approval())
}

fn user_content(brief: &str, feedback: Option<&Verdict>) -> String {
    let mut content = format!("Create an engaging social media ad for: {brief}");
    if let Some(verdict) = feedback {
        content.push_str(&format!(
            "\n\nPrevious feedback: {}\nPlease revise accordingly.",
            verdict.text()
        ));
    }
    content
}

/// Deterministic draft used when the generation service fails.
///
/// Revisions start from the template for the rejection's category and skip
/// any template equal to `previous`, so a revision always changes the copy.
pub fn fallback_draft(brief: &str, feedback: Option<&Verdict>, previous: &str) -> String {
    let product = truncate_chars(brief.trim(), TEMPLATE_PRODUCT_CHARS);

    let Some(verdict) = feedback else {
        return format!("✨ NEW: {product}! Perfect for the modern lifestyle. Shop today! 🚀");
    };

    let start = match verdict.category() {
        Some(Category::Claim) | None => 0,
        Some(Category::Tone) => 1,
        Some(Category::Clarity) => 2,
        Some(Category::Other) => 3,
    };

    (0..REVISION_TEMPLATES)
        .map(|offset| revision_template(start + offset, product))
        .find(|candidate| candidate != previous)
        .unwrap_or_else(|| revision_template(start, product))
}

fn revision_template(index: usize, product: &str) -> String {
    match index % REVISION_TEMPLATES {
        0 => format!("🌟 Discover {product}! Eco-conscious. Quality crafted. Get yours now! 💚"),
        1 => format!("🎉 Meet {product}! Made to brighten your day. Grab yours today! ☀️"),
        2 => format!("{product}. Simple. Useful. Ready when you are. Shop now! 🛒"),
        _ => format!("💡 Say hello to {product}! Thoughtfully made for everyday life. ✨"),
    }
}
