//! Layered configuration.
//!
//! Built-in defaults, then an optional TOML file (`--config`, or
//! `~/.config/creative-copilot/copilot.toml` when present), then CLI flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::image::{DEFAULT_IMAGE_MODEL, ImageProvider};
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, RoleProfile};
use crate::reviewer::DEFAULT_CHAR_CEILING;
use crate::router::DEFAULT_RETRY_CEILING;

/// Default hard limit on step invocations per run.
pub const DEFAULT_STEP_CEILING: u32 = 10;

/// Smallest step ceiling that fits one draft, one review and production.
const MIN_STEP_CEILING: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Draft attempts allowed before the router forces production.
    pub retry_ceiling: u32,
    /// Hard limit on step invocations; exceeding it fails the run.
    pub step_ceiling: u32,
    /// Platform character ceiling used by the rule-based reviewer.
    pub char_ceiling: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            retry_ceiling: DEFAULT_RETRY_CEILING,
            step_ceiling: DEFAULT_STEP_CEILING,
            char_ceiling: DEFAULT_CHAR_CEILING,
        }
    }
}

impl WorkflowSettings {
    /// Steps needed when every draft is rejected: `retry_ceiling + 1`
    /// draft/review rounds, then production.
    pub fn worst_case_steps(&self) -> u32 {
        2 * (self.retry_ceiling + 1) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub provider: ImageProvider,
    pub model: String,
    /// Directory generated images are written to.
    pub output_dir: PathBuf,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            provider: ImageProvider::default(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Full co-pilot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig {
    pub workflow: WorkflowSettings,
    pub writer: RoleProfile,
    pub reviewer: RoleProfile,
    pub llm: LlmSettings,
    pub image: ImageSettings,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowSettings::default(),
            writer: RoleProfile::WRITER,
            reviewer: RoleProfile::REVIEWER,
            llm: LlmSettings::default(),
            image: ImageSettings::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("creative-copilot")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    config_dir().join("copilot.toml")
}

impl CopilotConfig {
    /// Parse a TOML document. Missing sections keep their defaults.
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path. Any read or parse failure is an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Load from `explicit`, or from the default location when it exists.
    /// A broken file at the default location only warns.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let path = default_config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::from_file(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wf = &self.workflow;
        if wf.retry_ceiling < 1 {
            return Err(ConfigError::Invalid("retry_ceiling must be at least 1".into()));
        }
        if wf.step_ceiling < MIN_STEP_CEILING {
            return Err(ConfigError::Invalid(format!(
                "step_ceiling must be at least {MIN_STEP_CEILING}"
            )));
        }
        if wf.char_ceiling < 1 {
            return Err(ConfigError::Invalid("char_ceiling must be at least 1".into()));
        }
        for (role, profile) in [("writer", &self.writer), ("reviewer", &self.reviewer)] {
            if !(0.0..=2.0).contains(&profile.temperature) {
                return Err(ConfigError::Invalid(format!(
                    "{role}.temperature must be within 0.0..=2.0"
                )));
            }
            if profile.max_tokens == 0 {
                return Err(ConfigError::Invalid(format!("{role}.max_tokens must be positive")));
            }
        }
        if wf.step_ceiling < wf.worst_case_steps() {
            tracing::warn!(
                step_ceiling = wf.step_ceiling,
                needed = wf.worst_case_steps(),
                "step_ceiling may abort runs before the retry ceiling is reached"
            );
        }
        Ok(())
    }
}

/// API credentials gathered from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub groq_api_key: Option<String>,
    pub together_api_key: Option<String>,
    pub huggingface_token: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Credentials {
    pub fn groq(&self) -> Option<&str> {
        present(&self.groq_api_key)
    }

    /// Token for the configured image provider.
    pub fn image_token(&self, provider: ImageProvider) -> Option<&str> {
        match provider {
            ImageProvider::Together => present(&self.together_api_key),
            ImageProvider::Huggingface => present(&self.huggingface_token),
        }
    }

    /// Problems that would degrade a run. Empty means fully configured.
    pub fn issues(&self, provider: ImageProvider) -> Vec<String> {
        let mut issues = Vec::new();
        match self.groq() {
            None => issues.push("GROQ_API_KEY is missing".to_string()),
            Some(key) if !key.starts_with("gsk_") => {
                issues.push("GROQ_API_KEY (should start with 'gsk_')".to_string())
            }
            Some(_) => {}
        }
        if self.image_token(provider).is_none() {
            let var = match provider {
                ImageProvider::Together => "TOGETHER_API_KEY",
                ImageProvider::Huggingface => "HUGGINGFACE_API_TOKEN",
            };
            issues.push(format!("{var} is missing (images will be simulated)"));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CopilotConfig::default();
        assert_eq!(config.workflow.retry_ceiling, 3);
        assert_eq!(config.workflow.step_ceiling, 10);
        assert_eq!(config.workflow.char_ceiling, 280);
        assert_eq!(config.writer.temperature, 0.75);
        assert_eq!(config.reviewer.max_tokens, 256);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.image.provider, ImageProvider::Together);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_step_ceiling_fits_worst_case() {
        let wf = WorkflowSettings::default();
        assert_eq!(wf.worst_case_steps(), 9);
        assert!(wf.step_ceiling >= wf.worst_case_steps());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = r#"
            [workflow]
            retry_ceiling = 5

            [image]
            provider = "huggingface"
        "#;
        let config = CopilotConfig::from_toml(Path::new("copilot.toml"), text).unwrap();
        assert_eq!(config.workflow.retry_ceiling, 5);
        assert_eq!(config.workflow.step_ceiling, 10);
        assert_eq!(config.image.provider, ImageProvider::Huggingface);
        assert_eq!(config.writer, RoleProfile::WRITER);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = CopilotConfig::from_toml(Path::new("bad.toml"), "workflow = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let err = CopilotConfig::load(Some(Path::new("/nonexistent/copilot.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = CopilotConfig::default();
        config.workflow.retry_ceiling = 0;
        assert!(config.validate().is_err());

        let mut config = CopilotConfig::default();
        config.workflow.step_ceiling = 2;
        assert!(config.validate().is_err());

        let mut config = CopilotConfig::default();
        config.reviewer.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn credential_issues() {
        let creds = Credentials {
            groq_api_key: Some("gsk_abc".into()),
            together_api_key: Some("tok".into()),
            huggingface_token: None,
        };
        assert!(creds.issues(ImageProvider::Together).is_empty());
        assert_eq!(
            creds.issues(ImageProvider::Huggingface),
            vec!["HUGGINGFACE_API_TOKEN is missing (images will be simulated)"]
        );

        let bad = Credentials {
            groq_api_key: Some("sk-wrong".into()),
            together_api_key: Some("  ".into()),
            ..Credentials::default()
        };
        let issues = bad.issues(ImageProvider::Together);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("gsk_"));
        assert!(bad.image_token(ImageProvider::Together).is_none());
    }
}
