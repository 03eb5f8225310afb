//! Batch runs over the built-in example briefs with offline services.

use std::sync::Arc;
use std::time::Duration;

use copilot_agents::Workflow;
use copilot_agents::catalog::{self, ALL_EXAMPLES};
use copilot_agents::image::{self, SIMULATED_REFERENCE};
use copilot_agents::llm;
use copilot_agents::output::render_batch_summary;
use copilot_agents::state::{Agent, Outcome};

fn offline_workflow() -> Workflow {
    Workflow::new(
        Arc::new(llm::Unavailable::new("no key")),
        Arc::new(image::Simulated),
    )
}

#[tokio::test]
async fn whole_catalog_completes_offline() {
    let workflow = offline_workflow();

    let entries = catalog::run_batch(&workflow, ALL_EXAMPLES, Duration::ZERO).await;

    assert_eq!(entries.len(), ALL_EXAMPLES.len());
    for (entry, example) in entries.iter().zip(ALL_EXAMPLES) {
        assert_eq!(entry.name, example.name);
        let result = entry.outcome.as_ref().unwrap();
        assert_eq!(result.brief, example.description);
        assert!(!result.final_copy.is_empty());
        assert_eq!(result.image_reference, SIMULATED_REFERENCE);
        assert!(result.attempt_count >= 1 && result.attempt_count <= 4);
        assert_eq!(result.feedback_history.len() as u32, result.attempt_count);
        assert!(
            result
                .execution_log
                .iter()
                .filter(|e| e.agent != Agent::ArtDirector)
                .all(|e| e.outcome == Outcome::Degraded)
        );
    }

    let summary = render_batch_summary(&entries);
    assert!(summary.contains("Successfully completed 10/10 campaigns"));
    assert!(summary.contains("• Pet Products:"));
}

#[tokio::test]
async fn runs_do_not_share_state() {
    let workflow = offline_workflow();
    let pair = [ALL_EXAMPLES[1], ALL_EXAMPLES[1]];

    let entries = catalog::run_batch(&workflow, &pair, Duration::ZERO).await;

    let first = entries[0].outcome.as_ref().unwrap();
    let second = entries[1].outcome.as_ref().unwrap();
    assert_eq!(first.attempt_count, second.attempt_count);
    assert_eq!(first.feedback_history, second.feedback_history);
    assert_eq!(first.execution_log.len(), second.execution_log.len());
}

#[tokio::test(start_paused = true)]
async fn batch_pauses_between_campaigns() {
    let workflow = offline_workflow();
    let started = tokio::time::Instant::now();

    let entries = catalog::run_batch(&workflow, &ALL_EXAMPLES[..3], Duration::from_secs(5)).await;

    assert_eq!(entries.len(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(15));
}
