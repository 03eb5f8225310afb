//! Campaign state threaded through one workflow run.
//!
//! Steps never mutate the state directly. Each one borrows the state for the
//! length of its invocation, returns a [`StateDelta`], and the workflow driver
//! merges it with [`CampaignState::apply`]. All invariants on the record are
//! enforced in that single merge point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reviewer::Verdict;

/// Outcome recorded for a step in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    /// The external service failed and a deterministic fallback was used.
    Degraded,
    Error,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "SUCCESS"),
            Outcome::Degraded => write!(f, "DEGRADED"),
            Outcome::Error => write!(f, "ERROR"),
        }
    }
}

/// Agent identities that write to the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agent {
    Writer,
    Reviewer,
    #[serde(rename = "Art Director")]
    ArtDirector,
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Agent::Writer => write!(f, "Writer"),
            Agent::Reviewer => write!(f, "Reviewer"),
            Agent::ArtDirector => write!(f, "Art Director"),
        }
    }
}

/// One audit record in the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub agent: Agent,
    pub action: String,
    pub outcome: Outcome,
    /// Iteration the step ran in.
    pub iteration: u32,
    /// Length in characters of what the step produced.
    pub result_length: usize,
}

impl LogEntry {
    pub fn new(agent: Agent, action: &str, result: &str, outcome: Outcome, iteration: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            agent,
            action: action.to_string(),
            outcome,
            iteration,
            result_length: result.chars().count(),
        }
    }
}

/// Partial update produced by a single step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub draft: Option<String>,
    pub verdict: Option<Verdict>,
    pub image_reference: Option<String>,
    /// Added to `attempt_count`.
    pub attempts: u32,
    /// Added to `iteration_count`.
    pub iterations: u32,
    pub log: Option<LogEntry>,
}

impl StateDelta {
    /// Delta for a Draft Generator run.
    pub fn draft(draft: String, log: LogEntry) -> Self {
        Self {
            draft: Some(draft),
            attempts: 1,
            iterations: 1,
            log: Some(log),
            ..Self::default()
        }
    }

    /// Delta for a Compliance Reviewer run.
    pub fn review(verdict: Verdict, log: LogEntry) -> Self {
        Self {
            verdict: Some(verdict),
            log: Some(log),
            ..Self::default()
        }
    }

    /// Delta for an Asset Producer run.
    pub fn asset(image_reference: String, log: LogEntry) -> Self {
        Self {
            image_reference: Some(image_reference),
            iterations: 1,
            log: Some(log),
            ..Self::default()
        }
    }
}

/// The mutable record owned by the driver for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    input_brief: String,
    draft: String,
    feedback_history: Vec<String>,
    approved_text: Option<String>,
    image_reference: String,
    attempt_count: u32,
    iteration_count: u32,
    compliance_flags: Vec<String>,
    is_approved: bool,
    execution_log: Vec<LogEntry>,
}

impl CampaignState {
    pub fn new(input_brief: &str) -> Self {
        Self {
            input_brief: input_brief.to_string(),
            ..Self::default()
        }
    }

    /// Merge a step's delta into the record.
    ///
    /// Counters only grow, history and log are append-only, `approved_text` is
    /// set at most once, and rejection flags are deduplicated by exact text.
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(draft) = delta.draft {
            self.draft = draft;
        }
        self.attempt_count += delta.attempts;
        self.iteration_count += delta.iterations;

        if let Some(verdict) = delta.verdict {
            if verdict.is_approval() {
                if self.approved_text.is_none() {
                    self.approved_text = Some(self.draft.clone());
                }
                self.is_approved = true;
            } else {
                self.is_approved = false;
                if !self.compliance_flags.iter().any(|f| f == verdict.text()) {
                    self.compliance_flags.push(verdict.text().to_string());
                }
            }
            self.feedback_history.push(verdict.into_text());
        }

        if let Some(reference) = delta.image_reference {
            self.image_reference = reference;
        }
        if let Some(entry) = delta.log {
            self.execution_log.push(entry);
        }
    }

    pub fn input_brief(&self) -> &str {
        &self.input_brief
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn feedback_history(&self) -> &[String] {
        &self.feedback_history
    }

    /// Most recent verdict text, if any review has run.
    pub fn latest_feedback(&self) -> Option<&str> {
        self.feedback_history.last().map(String::as_str)
    }

    pub fn latest_verdict(&self) -> Option<Verdict> {
        self.latest_feedback().map(Verdict::parse)
    }

    pub fn approved_text(&self) -> Option<&str> {
        self.approved_text.as_deref()
    }

    pub fn image_reference(&self) -> &str {
        &self.image_reference
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn compliance_flags(&self) -> &[String] {
        &self.compliance_flags
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }

    pub fn execution_log(&self) -> &[LogEntry] {
        &self.execution_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(agent: Agent) -> LogEntry {
        LogEntry::new(agent, "test", "", Outcome::Success, 1)
    }

    #[test]
    fn new_state_has_defaults() {
        let state = CampaignState::new("bamboo water bottle");
        assert_eq!(state.input_brief(), "bamboo water bottle");
        assert_eq!(state.draft(), "");
        assert!(state.feedback_history().is_empty());
        assert!(state.approved_text().is_none());
        assert_eq!(state.image_reference(), "");
        assert_eq!(state.attempt_count(), 0);
        assert_eq!(state.iteration_count(), 0);
        assert!(!state.is_approved());
        assert!(state.execution_log().is_empty());
    }

    #[test]
    fn draft_delta_bumps_both_counters() {
        let mut state = CampaignState::new("brief");
        state.apply(StateDelta::draft("copy one".into(), log(Agent::Writer)));
        state.apply(StateDelta::draft("copy two".into(), log(Agent::Writer)));
        assert_eq!(state.draft(), "copy two");
        assert_eq!(state.attempt_count(), 2);
        assert_eq!(state.iteration_count(), 2);
        assert_eq!(state.execution_log().len(), 2);
    }

    #[test]
    fn approval_captures_current_draft() {
        let mut state = CampaignState::new("brief");
        state.apply(StateDelta::draft("final copy".into(), log(Agent::Writer)));
        state.apply(StateDelta::review(Verdict::parse("APPROVED"), log(Agent::Reviewer)));
        assert!(state.is_approved());
        assert_eq!(state.approved_text(), Some("final copy"));
        assert!(state.compliance_flags().is_empty());
    }

    #[test]
    fn identical_rejections_flag_once() {
        let mut state = CampaignState::new("brief");
        let reject = "[CLAIM] Remove unverified claim: '100%'";
        state.apply(StateDelta::review(Verdict::parse(reject), log(Agent::Reviewer)));
        state.apply(StateDelta::review(Verdict::parse(reject), log(Agent::Reviewer)));
        state.apply(StateDelta::review(
            Verdict::parse("[TONE] Avoid negative language"),
            log(Agent::Reviewer),
        ));
        assert_eq!(state.feedback_history().len(), 3);
        assert_eq!(state.compliance_flags(), &[
            reject.to_string(),
            "[TONE] Avoid negative language".to_string()
        ]);
    }

    #[test]
    fn rejection_after_approval_keeps_approved_text() {
        let mut state = CampaignState::new("brief");
        state.apply(StateDelta::draft("first".into(), log(Agent::Writer)));
        state.apply(StateDelta::review(Verdict::parse("APPROVED"), log(Agent::Reviewer)));
        state.apply(StateDelta::draft("second".into(), log(Agent::Writer)));
        state.apply(StateDelta::review(Verdict::parse("[TONE] flat"), log(Agent::Reviewer)));
        assert!(!state.is_approved());
        assert_eq!(state.approved_text(), Some("first"));
    }

    #[test]
    fn asset_delta_sets_reference_without_attempt() {
        let mut state = CampaignState::new("brief");
        state.apply(StateDelta::asset("out.png".into(), log(Agent::ArtDirector)));
        assert_eq!(state.image_reference(), "out.png");
        assert_eq!(state.attempt_count(), 0);
        assert_eq!(state.iteration_count(), 1);
    }

    #[test]
    fn outcome_serializes_upper_case() {
        let json = serde_json::to_string(&Outcome::Degraded).unwrap();
        assert_eq!(json, "\"DEGRADED\"");
        let json = serde_json::to_string(&Agent::ArtDirector).unwrap();
        assert_eq!(json, "\"Art Director\"");
    }
}
