//! copilot-agents: creative campaign co-pilot.
//!
//! Three agents collaborate on one campaign at a time:
//! - Writer: drafts and revises social ad copy
//! - Reviewer: compliance check producing one verdict per draft
//! - Art Director: turns the finished copy into a promotional image
//!
//! The [`workflow::Workflow`] driver loops writer → reviewer until the copy
//! is approved or the retry ceiling forces it onward, then runs the art
//! director once.

pub mod archive;
pub mod art_director;
pub mod catalog;
pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod output;
pub mod reviewer;
pub mod router;
pub mod state;
pub mod workflow;
pub mod writer;

pub use error::WorkflowError;
pub use workflow::{CampaignResult, Workflow};

/// Longest prefix of `text` with at most `max` characters.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 40), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
