//! Image generation service.
//!
//! The art director only sees [`ImageGenerator`]. Two HTTP backends are
//! provided (Together AI and Hugging Face inference), plus a simulated
//! generator used when no token is configured and a failing null object.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Reference returned by [`Simulated`].
pub const SIMULATED_REFERENCE: &str = "Simulated image (no API token provided)";

/// Anything that turns a prompt into an artifact reference (path or URL).
pub trait ImageGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Which HTTP backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    #[default]
    Together,
    Huggingface,
}

impl std::fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageProvider::Together => write!(f, "together"),
            ImageProvider::Huggingface => write!(f, "huggingface"),
        }
    }
}

impl std::str::FromStr for ImageProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "together" => Ok(ImageProvider::Together),
            "huggingface" | "hf" => Ok(ImageProvider::Huggingface),
            other => Err(format!("unknown image provider '{other}' (expected together or huggingface)")),
        }
    }
}

/// Write image bytes as `campaign_output_<millis>.png` under `dir`.
pub async fn save_image(dir: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if bytes.is_empty() {
        anyhow::bail!("Image service returned no data");
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!(
        "campaign_output_{}.png",
        chrono::Utc::now().timestamp_millis()
    ));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Image saved");
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct TogetherResponse {
    data: Vec<TogetherImage>,
}

#[derive(Debug, Deserialize)]
struct TogetherImage {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Together AI images client.
pub struct TogetherImages {
    api_key: String,
    model: String,
    base_url: String,
    output_dir: PathBuf,
    http: reqwest::Client,
}

impl TogetherImages {
    pub fn new(api_key: String, output_dir: PathBuf) -> Self {
        Self {
            api_key,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: TOGETHER_BASE_URL.to_string(),
            output_dir,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": &self.model,
            "prompt": prompt,
            "width": 1024,
            "height": 1024,
            "steps": 4,
            "n": 1,
            "response_format": "b64_json",
        });

        let resp = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to call Together images API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Together images API error {status}: {body}");
        }

        let parsed = resp
            .json::<TogetherResponse>()
            .await
            .context("Failed to parse Together images response")?;
        let image = parsed
            .data
            .into_iter()
            .next()
            .context("Together images response had no data")?;

        match (image.b64_json, image.url) {
            (Some(b64), _) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(b64.trim())
                    .context("Invalid base64 image payload")?;
                let path = save_image(&self.output_dir, &bytes).await?;
                Ok(path.display().to_string())
            }
            (None, Some(url)) => Ok(url),
            (None, None) => anyhow::bail!("Together images response had neither data nor url"),
        }
    }
}

impl ImageGenerator for TogetherImages {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.request(prompt))
    }
}

/// Hugging Face inference client. The endpoint returns raw image bytes.
pub struct HuggingFaceImages {
    token: String,
    model: String,
    base_url: String,
    output_dir: PathBuf,
    http: reqwest::Client,
}

impl HuggingFaceImages {
    pub fn new(token: String, output_dir: PathBuf) -> Self {
        Self {
            token,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: HUGGINGFACE_BASE_URL.to_string(),
            output_dir,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/{}", self.base_url, self.model))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await
            .context("Failed to call Hugging Face inference API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Hugging Face inference error {status}: {body}");
        }

        let bytes = resp
            .bytes()
            .await
            .context("Failed to read Hugging Face image bytes")?;
        let path = save_image(&self.output_dir, &bytes).await?;
        Ok(path.display().to_string())
    }
}

impl ImageGenerator for HuggingFaceImages {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.request(prompt))
    }
}

/// Offline generator: succeeds with a fixed reference and no network call.
#[derive(Debug, Clone, Default)]
pub struct Simulated;

impl ImageGenerator for Simulated {
    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Ok::<_, anyhow::Error>(SIMULATED_REFERENCE.to_string()) })
    }
}

/// Null generator that always fails.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl ImageGenerator for Unavailable {
    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            Err::<String, _>(anyhow::anyhow!(
                "image service unavailable: {}",
                self.reason
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("copilot-image-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn save_image_writes_png_file() {
        let dir = scratch_dir("save");
        let path = save_image(&dir, b"\x89PNG fake").await.unwrap();
        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("campaign_output_") && name.ends_with(".png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG fake");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn save_image_rejects_empty_payload() {
        let err = save_image(&scratch_dir("empty"), &[]).await.unwrap_err();
        assert!(err.to_string().contains("no data"));
    }

    #[test]
    fn parses_together_payloads() {
        let b64: TogetherResponse =
            serde_json::from_str(r#"{"data": [{"index": 0, "b64_json": "aGk="}]}"#).unwrap();
        assert_eq!(b64.data[0].b64_json.as_deref(), Some("aGk="));
        let url: TogetherResponse =
            serde_json::from_str(r#"{"data": [{"url": "https://img/x.png"}]}"#).unwrap();
        assert_eq!(url.data[0].url.as_deref(), Some("https://img/x.png"));
    }

    #[tokio::test]
    async fn simulated_and_unavailable() {
        assert_eq!(Simulated.generate("p").await.unwrap(), SIMULATED_REFERENCE);
        let err = Unavailable::new("no token").generate("p").await.unwrap_err();
        assert!(err.to_string().contains("no token"));
    }

    #[test]
    fn provider_names_parse() {
        let provider: ImageProvider = serde_json::from_str("\"huggingface\"").unwrap();
        assert_eq!(provider, ImageProvider::Huggingface);
        assert_eq!(ImageProvider::default().to_string(), "together");
        assert_eq!("HF".parse::<ImageProvider>(), Ok(ImageProvider::Huggingface));
        assert!("dalle".parse::<ImageProvider>().is_err());
    }
}
