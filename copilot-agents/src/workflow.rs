//! Workflow driver: runs the draft → review → (revise | produce) loop.
//!
//! The driver exclusively owns the [`CampaignState`] for one run. Steps borrow
//! it for their own invocation and hand back a delta. Termination is
//! guaranteed twice over: the router forces production past the retry
//! ceiling, and the step ceiling aborts a run that somehow keeps looping.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use serde::{Deserialize, Serialize};

use crate::art_director::ArtDirector;
use crate::config::{CopilotConfig, WorkflowSettings};
use crate::error::WorkflowError;
use crate::image::ImageGenerator;
use crate::llm::{RoleProfile, TextGenerator};
use crate::reviewer::Reviewer;
use crate::router::{Route, route};
use crate::state::{CampaignState, LogEntry};
use crate::writer::Writer;

/// Driver phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drafting,
    Reviewing,
    Producing,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Drafting => write!(f, "drafting"),
            Phase::Reviewing => write!(f, "reviewing"),
            Phase::Producing => write!(f, "producing"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Finalized outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub brief: String,
    /// Copy the reviewer approved, if any.
    pub approved_text: Option<String>,
    /// Approved copy, or the latest draft after a forced proceed.
    pub final_copy: String,
    pub image_reference: String,
    pub attempt_count: u32,
    pub iteration_count: u32,
    pub feedback_history: Vec<String>,
    pub compliance_flags: Vec<String>,
    pub is_approved: bool,
    /// Step invocations the run took.
    pub steps: u32,
    pub duration: Duration,
    pub execution_log: Vec<LogEntry>,
}

impl CampaignResult {
    fn from_state(state: &CampaignState, steps: u32, duration: Duration) -> Self {
        let final_copy = state.approved_text().unwrap_or(state.draft()).to_string();
        Self {
            brief: state.input_brief().to_string(),
            approved_text: state.approved_text().map(str::to_string),
            final_copy,
            image_reference: state.image_reference().to_string(),
            attempt_count: state.attempt_count(),
            iteration_count: state.iteration_count(),
            feedback_history: state.feedback_history().to_vec(),
            compliance_flags: state.compliance_flags().to_vec(),
            is_approved: state.is_approved(),
            steps,
            duration,
            execution_log: state.execution_log().to_vec(),
        }
    }
}

/// The campaign workflow with its injected collaborators.
pub struct Workflow {
    writer: Writer,
    reviewer: Reviewer,
    art_director: ArtDirector,
    retry_ceiling: u32,
    step_ceiling: u32,
}

impl Workflow {
    /// Build with default role profiles and ceilings.
    pub fn new(text: Arc<dyn TextGenerator>, images: Arc<dyn ImageGenerator>) -> Self {
        Self::from_config(&CopilotConfig::default(), text, images)
    }

    pub fn from_config(
        config: &CopilotConfig,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self::with_settings(
            &config.workflow,
            config.writer,
            config.reviewer,
            text,
            images,
        )
    }

    pub fn with_settings(
        settings: &WorkflowSettings,
        writer: RoleProfile,
        reviewer: RoleProfile,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            writer: Writer::new(text.clone(), writer),
            reviewer: Reviewer::new(text, reviewer, settings.char_ceiling),
            art_director: ArtDirector::new(images),
            retry_ceiling: settings.retry_ceiling,
            step_ceiling: settings.step_ceiling,
        }
    }

    /// Run one campaign to completion.
    ///
    /// The brief is kept exactly as given. Returns a complete result even when
    /// every service call degraded, or an error when the brief is blank or the
    /// step ceiling is exceeded.
    pub async fn run(&self, brief: &str) -> Result<CampaignResult, WorkflowError> {
        if brief.trim().is_empty() {
            return Err(WorkflowError::EmptyBrief);
        }

        let started = Instant::now();
        let mut state = CampaignState::new(brief);
        let mut phase = Phase::Drafting;
        let mut steps = 0u32;

        tracing::info!(
            brief,
            retry_ceiling = self.retry_ceiling,
            step_ceiling = self.step_ceiling,
            "Starting campaign"
        );

        while phase != Phase::Done {
            if steps >= self.step_ceiling {
                tracing::error!(steps, %phase, "Step ceiling exceeded, aborting campaign");
                return Err(WorkflowError::StepCeilingExceeded { steps, phase });
            }
            steps += 1;
            phase = self.step(phase, &mut state).await;
        }

        let duration = started.elapsed();
        tracing::info!(
            attempts = state.attempt_count(),
            approved = state.is_approved(),
            steps,
            elapsed_ms = duration.as_millis() as u64,
            "Campaign complete"
        );
        Ok(CampaignResult::from_state(&state, steps, duration))
    }

    /// Run the step for `phase`, merge its delta and return the next phase.
    async fn step(&self, phase: Phase, state: &mut CampaignState) -> Phase {
        match phase {
            Phase::Drafting => {
                let delta = self.writer.draft(state).await;
                state.apply(delta);
                Phase::Reviewing
            }
            Phase::Reviewing => {
                let delta = self.reviewer.review(state).await;
                state.apply(delta);
                match route(
                    state.attempt_count(),
                    state.latest_feedback(),
                    self.retry_ceiling,
                ) {
                    Route::Proceed => Phase::Producing,
                    Route::Revise => {
                        tracing::info!(attempt = state.attempt_count(), "Looping back to writer");
                        Phase::Drafting
                    }
                    Route::ForcedProceed => {
                        tracing::warn!(
                            attempts = state.attempt_count(),
                            retry_ceiling = self.retry_ceiling,
                            "Retry ceiling exceeded, proceeding without approval"
                        );
                        Phase::Producing
                    }
                }
            }
            Phase::Producing => {
                let delta = self.art_director.produce(state).await;
                state.apply(delta);
                Phase::Done
            }
            Phase::Done => Phase::Done,
        }
    }
}
