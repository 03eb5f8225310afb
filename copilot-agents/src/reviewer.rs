//! Compliance reviewer agent.
//!
//! Produces exactly one verdict per draft: the approval marker, or a single
//! tagged rejection sentence. When the generation service is down a
//! rule-based checker stands in and still yields exactly one verdict.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::{GenerationRequest, RoleProfile, TextGenerator};
use crate::state::{Agent, CampaignState, LogEntry, Outcome, StateDelta};

/// Literal marker a reviewer returns to approve a draft.
pub const APPROVAL_MARKER: &str = "APPROVED";

/// Default platform length ceiling, in characters.
pub const DEFAULT_CHAR_CEILING: usize = 280;

/// Unverifiable claim phrases, checked in order.
pub const CLAIM_PHRASES: &[&str] = &[
    "100%",
    "guarantee",
    "guaranteed",
    "miracle",
    "instant results",
    "best in the world",
    "never",
    "always works",
    "scientifically proven",
    "approved by",
    "clinically tested",
];

/// Negative or alarming vocabulary.
pub const NEGATIVE_WORDS: &[&str] = &["toxic", "harmful", "dangerous", "problem", "issue"];

pub const REVIEWER_SYSTEM: &str = r#"You are a strict legal and brand compliance officer for social media ads.

Your job is to:
1. Identify unverified claims (e.g., "100%", "guaranteed", "best", "miracle", "scientifically proven")
2. Check for brand voice alignment (must be energetic, positive, authentic)
3. Verify clarity and conciseness
4. Ensure no misleading statements

RESPOND IN EXACTLY ONE OF THESE WAYS:

Option A - If compliant: Reply with ONLY the word "APPROVED"

Option B - If issues found: Provide ONE specific, actionable feedback (max 1 sentence).
Start with the issue type: [CLAIM], [TONE], [CLARITY], or [OTHER]

Example rejections:
- "[CLAIM] Remove '100%' - it's unverified"
- "[TONE] Make it more energetic"
- "[CLARITY] Specify what 'eco-friendly' means""#;

/// Rejection category carried by a verdict's leading tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Claim,
    Tone,
    Clarity,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Claim,
        Category::Tone,
        Category::Clarity,
        Category::Other,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Category::Claim => "[CLAIM]",
            Category::Tone => "[TONE]",
            Category::Clarity => "[CLARITY]",
            Category::Other => "[OTHER]",
        }
    }

    /// Category named by the leading tag of `text`, if any.
    pub fn from_tag(text: &str) -> Option<Category> {
        let upper = text.trim_start().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| upper.starts_with(c.tag()))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = self.tag();
        write!(f, "{}", &tag[1..tag.len() - 1])
    }
}

/// True when a verdict text signals approval.
///
/// Matches the marker exactly or as a prefix, case-insensitively. A rejection
/// that merely mentions "approved" further in is not an approval.
pub fn is_approval(text: &str) -> bool {
    text.trim().to_ascii_uppercase().starts_with(APPROVAL_MARKER)
}

/// A single reviewer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    text: String,
    /// `None` for approvals.
    category: Option<Category>,
}

impl Verdict {
    /// Classify raw reviewer output. Anything that is neither the approval
    /// marker nor a recognised tag is a rejection of category `OTHER`.
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let category = if is_approval(&text) {
            None
        } else {
            Some(Category::from_tag(&text).unwrap_or(Category::Other))
        };
        Self { text, category }
    }

    pub fn approved() -> Self {
        Self {
            text: APPROVAL_MARKER.to_string(),
            category: None,
        }
    }

    pub fn rejected(category: Category, justification: &str) -> Self {
        Self {
            text: format!("{} {}", category.tag(), justification.trim()),
            category: Some(category),
        }
    }

    pub fn is_approval(&self) -> bool {
        self.category.is_none()
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Rejection with no recognised tag.
    pub fn is_malformed(&self) -> bool {
        self.category.is_some() && Category::from_tag(&self.text).is_none()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Deterministic compliance check. First matching rule wins: claim
/// phrases, then negative tone, then length.
pub fn rule_check(draft: &str, char_ceiling: usize) -> Verdict {
    let lower = draft.to_lowercase();

    if let Some(phrase) = CLAIM_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Verdict::rejected(
            Category::Claim,
            &format!("Remove unverified claim: '{phrase}'"),
        );
    }

    if NEGATIVE_WORDS.iter().any(|w| lower.contains(w)) {
        return Verdict::rejected(Category::Tone, "Avoid negative language");
    }

    if draft.chars().count() > char_ceiling {
        return Verdict::rejected(
            Category::Clarity,
            &format!("Keep under {char_ceiling} characters for social media"),
        );
    }

    Verdict::approved()
}

/// The compliance reviewer agent.
pub struct Reviewer {
    llm: Arc<dyn TextGenerator>,
    profile: RoleProfile,
    char_ceiling: usize,
}

impl Reviewer {
    pub fn new(llm: Arc<dyn TextGenerator>, profile: RoleProfile, char_ceiling: usize) -> Self {
        Self {
            llm,
            profile,
            char_ceiling,
        }
    }

    /// Review the current draft and return the verdict delta.
    pub async fn review(&self, state: &CampaignState) -> StateDelta {
        let draft = state.draft();
        let content =
            format!("Review this ad copy: \"{draft}\"\n\nIs it compliant and ready to publish?");
        let request = GenerationRequest {
            system: REVIEWER_SYSTEM,
            content: &content,
            temperature: self.profile.temperature,
            max_tokens: self.profile.max_tokens,
        };

        let (verdict, outcome) = match self.llm.generate(request).await {
            Ok(text) if !text.trim().is_empty() => (Verdict::parse(&text), Outcome::Success),
            Ok(_) => {
                tracing::warn!("Reviewer returned an empty verdict, using rule-based checker");
                (rule_check(draft, self.char_ceiling), Outcome::Degraded)
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "Reviewer unavailable, using rule-based checker");
                (rule_check(draft, self.char_ceiling), Outcome::Degraded)
            }
        };

        if verdict.is_malformed() {
            tracing::warn!(verdict = verdict.text(), "Untagged verdict treated as OTHER rejection");
        }
        match verdict.category() {
            None => tracing::info!(%outcome, "Draft approved"),
            Some(category) => {
                tracing::info!(%outcome, %category, feedback = verdict.text(), "Revision needed")
            }
        }

        let log = LogEntry::new(
            Agent::Reviewer,
            "compliance_check",
            verdict.text(),
            outcome,
            state.iteration_count(),
        );
        StateDelta::review(verdict, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_marker_exact_and_prefix() {
        assert!(is_approval("APPROVED"));
        assert!(is_approval("  approved.  "));
        assert!(is_approval("APPROVED - looks great"));
        assert!(!is_approval(""));
        assert!(!is_approval("Not approved"));
    }

    #[test]
    fn rejection_mentioning_approved_is_not_approval() {
        let v = Verdict::parse("[CLAIM] 'FDA approved' is an unverifiable claim");
        assert!(!v.is_approval());
        assert_eq!(v.category(), Some(Category::Claim));
    }

    #[test]
    fn parses_each_tag() {
        for category in Category::ALL {
            let v = Verdict::parse(&format!("{} something", category.tag()));
            assert_eq!(v.category(), Some(category));
            assert!(!v.is_malformed());
        }
        assert_eq!(
            Verdict::parse("[tone] too gloomy").category(),
            Some(Category::Tone)
        );
    }

    #[test]
    fn malformed_verdict_is_other_rejection() {
        let v = Verdict::parse("This needs more work.");
        assert_eq!(v.category(), Some(Category::Other));
        assert!(v.is_malformed());
        assert_eq!(v.text(), "This needs more work.");
    }

    #[test]
    fn rule_check_claim_first() {
        let v = rule_check("100% toxic-free bottle", DEFAULT_CHAR_CEILING);
        assert_eq!(v.text(), "[CLAIM] Remove unverified claim: '100%'");
    }

    #[test]
    fn rule_check_tone_before_length() {
        let long = format!("No problem here {}", "x".repeat(300));
        let v = rule_check(&long, DEFAULT_CHAR_CEILING);
        assert_eq!(v.text(), "[TONE] Avoid negative language");
    }

    #[test]
    fn rule_check_length_counts_chars() {
        let at_limit = "é".repeat(280);
        assert!(rule_check(&at_limit, 280).is_approval());
        let over = "é".repeat(281);
        assert_eq!(
            rule_check(&over, 280).text(),
            "[CLARITY] Keep under 280 characters for social media"
        );
    }

    #[test]
    fn rule_check_approves_clean_copy() {
        let v = rule_check("✨ NEW: Bamboo bottle! Shop today! 🚀", DEFAULT_CHAR_CEILING);
        assert!(v.is_approval());
        assert_eq!(v.text(), APPROVAL_MARKER);
    }

    #[test]
    fn category_display_drops_brackets() {
        assert_eq!(Category::Clarity.to_string(), "CLARITY");
    }
}
