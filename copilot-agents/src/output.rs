//! Terminal presentation of campaign results.
//!
//! Pure formatting: nothing here affects the workflow.

use std::path::Path;

use anyhow::{Context, Result};

use crate::archive::ArchivedCampaign;
use crate::catalog::{BatchEntry, ExampleBrief};
use crate::reviewer::is_approval;
use crate::state::Outcome;
use crate::truncate_chars;
use crate::workflow::CampaignResult;

const WIDTH: usize = 80;

pub const DIAGRAM: &str = r#"
                     ┌─────────────────┐
                     │   USER INPUT    │
                     │ (Product Brief) │
                     └────────┬────────┘
                              │
                              ▼
                ┌─────────────────────────┐
                │   COPYWRITER AGENT      │◄──────────────┐
                │   "Generate Draft"      │               │
                └──────────┬──────────────┘               │
                           │                              │
                           ▼                              │
                ┌─────────────────────────┐               │
                │   REVIEWER AGENT        │               │
                │   "Check Compliance"    │               │
                └──────────┬──────────────┘               │
                           │                              │
                           ▼                              │
                ┌─────────────────────────┐   [REVISE]    │
                │   ROUTER DECISION       ├───────────────┘
                └──────────┬──────────────┘
                           │ [APPROVED or RETRY CEILING]
                           ▼
                ┌─────────────────────────┐
                │  ART DIRECTOR AGENT     │
                │  "Generate Image"       │
                └──────────┬──────────────┘
                           │
                           ▼
                     ┌────────────┐
                     │    DONE    │
                     └────────────┘
"#;

fn rule(c: char) -> String {
    std::iter::repeat_n(c, WIDTH).collect()
}

fn heading(out: &mut Vec<String>, title: &str) {
    out.push(rule('='));
    out.push(title.to_string());
    out.push(rule('='));
}

/// Render a full campaign report.
pub fn render_report(result: &CampaignResult) -> String {
    let mut out = Vec::new();

    heading(&mut out, "📱 SOCIAL MEDIA CAMPAIGN - FINAL OUTPUT");
    out.push(format!("📦 Brief: {}", result.brief));
    out.push(format!(
        "⏱️  Execution time: {:.2}s",
        result.duration.as_secs_f64()
    ));
    out.push(format!(
        "🔄 Attempts: {} | Iterations: {} | Review cycles: {}",
        result.attempt_count,
        result.iteration_count,
        result.feedback_history.len()
    ));
    if result.is_approved {
        out.push("✅ Approved by compliance review".to_string());
    } else {
        out.push("⚠️  Not approved: retry ceiling reached, latest draft used".to_string());
    }

    if !result.compliance_flags.is_empty() {
        out.push("⚠️  Compliance flags encountered:".to_string());
        for flag in &result.compliance_flags {
            out.push(format!("   • {flag}"));
        }
    }

    out.push(String::new());
    heading(&mut out, "📝 FINAL COPY:");
    out.extend(wrap_lines(&result.final_copy, WIDTH));

    out.push(String::new());
    heading(&mut out, "🖼️  GENERATED IMAGE:");
    out.push(result.image_reference.clone());

    if !result.feedback_history.is_empty() {
        out.push(String::new());
        heading(&mut out, "📋 REVIEW HISTORY:");
        for (i, feedback) in result.feedback_history.iter().enumerate() {
            let icon = if is_approval(feedback) { "✅" } else { "🔄" };
            out.push(format!("{}. {icon} {feedback}", i + 1));
        }
    }

    if !result.execution_log.is_empty() {
        out.push(String::new());
        heading(&mut out, "📊 AGENT EXECUTION LOG:");
        for entry in &result.execution_log {
            let icon = if entry.outcome == Outcome::Success { "✓" } else { "⚠" };
            out.push(format!(
                "{icon} [{}] {}: {} ({})",
                entry.timestamp.to_rfc3339(),
                entry.agent,
                entry.action,
                entry.outcome
            ));
        }
    }

    out.push(rule('='));
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Render archived campaigns as a compact table.
pub fn render_history(entries: &[ArchivedCampaign]) -> String {
    if entries.is_empty() {
        return "No archived campaigns.\n".to_string();
    }
    let mut out = Vec::new();
    for e in entries {
        let icon = if e.is_approved { "✅" } else { "⚠️" };
        out.push(format!(
            "#{} {icon} [{}] {} (attempts: {}, {:.2}s)",
            e.id,
            e.created_at,
            truncate_chars(&e.brief, 50),
            e.attempts,
            e.duration_ms as f64 / 1000.0
        ));
        out.push(format!("    {}", truncate_chars(&e.final_copy, 70)));
        out.push(format!("    {}", e.image_reference));
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Render the example catalog.
pub fn render_catalog(examples: &[ExampleBrief]) -> String {
    let mut out = vec!["📋 Available examples:".to_string(), String::new()];
    for (i, e) in examples.iter().enumerate() {
        out.push(format!("{}. {}", i + 1, e.name));
        out.push(format!("   Description: {}", e.description));
        out.push(format!("   Tone: {}", e.tone));
        out.push(format!("   Platforms: {}", e.platforms));
        out.push(String::new());
    }
    out.join("\n")
}

/// Render the per-campaign summary of a batch run.
pub fn render_batch_summary(entries: &[BatchEntry]) -> String {
    let completed = entries.iter().filter(|e| e.outcome.is_ok()).count();
    let mut out = Vec::new();
    heading(&mut out, "📊 BATCH SUMMARY");
    out.push(format!(
        "Successfully completed {completed}/{} campaigns",
        entries.len()
    ));
    out.push(String::new());
    for entry in entries {
        match &entry.outcome {
            Ok(result) => {
                let status = if result.is_approved { "✅ APPROVED" } else { "⏳ PENDING" };
                out.push(format!(
                    "• {}: {status} ({} attempts, {} iterations, {:.2}s)",
                    entry.name,
                    result.attempt_count,
                    result.iteration_count,
                    result.duration.as_secs_f64()
                ));
            }
            Err(e) => out.push(format!("• {}: ❌ FAILED ({e})", entry.name)),
        }
    }
    out.push(rule('='));
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Write a rendered report to `path`.
pub fn save_report(path: &Path, report: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(path, report).with_context(|| format!("Failed to write {}", path.display()))
}

/// Wrap text into lines of max_len characters, breaking on word boundaries.
fn wrap_lines(text: &str, max_len: usize) -> Vec<String> {
    let mut result = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= max_len {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            let needed = current.chars().count() + word.chars().count() + 1;
            if needed > max_len && !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}
