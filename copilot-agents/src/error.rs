//! Typed errors for conditions that end a run or reject configuration.

use std::path::PathBuf;

use crate::workflow::Phase;

/// Fatal outcome of a campaign run. Service failures never surface here;
/// they are absorbed by each step's fallback.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("campaign brief is empty")]
    EmptyBrief,
    #[error("step ceiling exceeded after {steps} steps (next phase: {phase})")]
    StepCeilingExceeded { steps: u32, phase: Phase },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can't read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
