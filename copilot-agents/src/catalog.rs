//! Built-in product briefs and sequential batch runs over them.

use std::time::Duration;

use crate::error::WorkflowError;
use crate::workflow::{CampaignResult, Workflow};

/// A named sample brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleBrief {
    pub name: &'static str,
    pub description: &'static str,
    pub tone: &'static str,
    pub platforms: &'static str,
}

pub const ALL_EXAMPLES: &[ExampleBrief] = &[
    ExampleBrief {
        name: "Eco-Friendly Product",
        description: "New eco-friendly water bottle, made from bamboo",
        tone: "Energetic, environmentally conscious",
        platforms: "Instagram, Facebook",
    },
    ExampleBrief {
        name: "Tech Product",
        description: "AI-powered smart watch with 24/7 health monitoring, sleep tracking, and fitness coaching",
        tone: "Modern, innovative, trustworthy",
        platforms: "LinkedIn, Twitter",
    },
    ExampleBrief {
        name: "Food & Beverage",
        description: "Organic cold-pressed juice blend with superfood ingredients, no added sugar",
        tone: "Fresh, healthy, vibrant",
        platforms: "Instagram, TikTok",
    },
    ExampleBrief {
        name: "Fashion",
        description: "Handcrafted leather backpack with laptop compartment, designed for urban professionals",
        tone: "Sophisticated, practical, stylish",
        platforms: "Pinterest, Instagram",
    },
    ExampleBrief {
        name: "Service/App",
        description: "Meditation app with personalized mindfulness exercises and sleep stories",
        tone: "Calm, supportive, inviting",
        platforms: "Facebook, Reddit",
    },
    ExampleBrief {
        name: "Home & Living",
        description: "Smart home security camera with AI motion detection and night vision",
        tone: "Secure, reliable, cutting-edge",
        platforms: "Facebook, YouTube",
    },
    ExampleBrief {
        name: "Beauty & Personal Care",
        description: "Natural skincare serum with vitamin C and hyaluronic acid, cruelty-free",
        tone: "Luxurious, clean, effective",
        platforms: "Instagram, TikTok",
    },
    ExampleBrief {
        name: "Fitness",
        description: "Adjustable resistance bands set with workout guide, perfect for home gym",
        tone: "Motivating, empowering, accessible",
        platforms: "YouTube, Instagram",
    },
    ExampleBrief {
        name: "Education",
        description: "Online coding bootcamp for beginners, learn Python in 8 weeks with mentorship",
        tone: "Encouraging, professional, growth-focused",
        platforms: "LinkedIn, Twitter",
    },
    ExampleBrief {
        name: "Pet Products",
        description: "Automatic pet feeder with portion control and scheduling via smartphone app",
        tone: "Caring, convenient, modern",
        platforms: "Facebook, Instagram",
    },
];

/// Look up an example by name, ignoring case.
pub fn find(name: &str) -> Option<&'static ExampleBrief> {
    let name = name.trim();
    ALL_EXAMPLES
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
}

/// Outcome of one campaign in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub outcome: Result<CampaignResult, WorkflowError>,
}

/// Run each example through `workflow` in order, sleeping `pause` between
/// campaigns to stay under provider rate limits. Every campaign gets its
/// own state; a failed run is recorded and the batch continues.
pub async fn run_batch(
    workflow: &Workflow,
    examples: &[ExampleBrief],
    pause: Duration,
) -> Vec<BatchEntry> {
    let mut entries = Vec::with_capacity(examples.len());
    for (i, example) in examples.iter().enumerate() {
        tracing::info!(
            index = i + 1,
            total = examples.len(),
            name = example.name,
            "Running example campaign"
        );
        let outcome = workflow.run(example.description).await;
        if let Err(e) = &outcome {
            tracing::error!(name = example.name, error = %e, "Example campaign failed");
        }
        entries.push(BatchEntry {
            name: example.name.to_string(),
            outcome,
        });
        if i + 1 < examples.len() && !pause.is_zero() {
            tracing::info!(secs = pause.as_secs_f64(), "Waiting before next campaign");
            tokio::time::sleep(pause).await;
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_ten_unique_names() {
        assert_eq!(ALL_EXAMPLES.len(), 10);
        for (i, a) in ALL_EXAMPLES.iter().enumerate() {
            assert!(!a.description.is_empty());
            for b in &ALL_EXAMPLES[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(b.name));
            }
        }
    }

    #[test]
    fn find_ignores_case() {
        assert_eq!(find("tech product").map(|e| e.name), Some("Tech Product"));
        assert_eq!(find("  PET PRODUCTS ").map(|e| e.name), Some("Pet Products"));
        assert!(find("Spaceships").is_none());
    }
}
