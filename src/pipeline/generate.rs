//! Caption generation: the opaque model boundary.
//!
//! The pipeline depends only on the [`Captioner`] trait — an opaque
//! capability turning a normalized image plus generation knobs into raw
//! caption strings. The shipped implementation, [`VlmCaptioner`], drives a
//! vision-capable chat provider through `edgequake-llm`; tests substitute a
//! stub. All prompt text lives in [`crate::prompts`] so it can change
//! without touching request plumbing here.

use crate::error::CaptionError;
use crate::pipeline::normalize::NormalizedImage;
use crate::prompts::{caption_request, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Generation-time tuning knobs, snapshotted from the config per request.
///
/// Every knob travels to the backend; each backend applies the subset its
/// API exposes. Chat-API backends have no beam search, so `num_beams` and
/// `top_k` only matter to local implementations of [`Captioner`].
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Maximum caption length in tokens.
    pub max_length: usize,
    /// Beam count for beam-search backends.
    pub num_beams: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Number of caption candidates requested.
    pub num_sequences: usize,
}

impl GenerationOptions {
    /// Snapshot the generation knobs from a config.
    pub fn from_config(config: &crate::config::CaptionConfig) -> Self {
        Self {
            max_length: config.max_length,
            num_beams: config.num_beams,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            num_sequences: config.num_sequences,
        }
    }
}

/// The opaque captioning capability.
///
/// `generate` returns *raw* captions — cleanup and deduplication happen in
/// [`crate::pipeline::cleanup`], never inside a backend.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Generate up to `options.num_sequences` raw captions for the image.
    async fn generate(
        &self,
        image: &NormalizedImage,
        options: &GenerationOptions,
    ) -> Result<Vec<String>, CaptionError>;

    /// Human-readable backend identifier for logs.
    fn name(&self) -> &str {
        "captioner"
    }
}

/// Captioner backed by a vision-capable chat provider.
///
/// One chat call per request: the system prompt sets the register, the user
/// message carries the image and asks for `num_sequences` captions, one per
/// line. Multi-candidate requests therefore cost a single provider call.
pub struct VlmCaptioner {
    provider: Arc<dyn LLMProvider>,
    label: String,
    timeout_secs: u64,
}

impl VlmCaptioner {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            provider,
            label: label.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl Captioner for VlmCaptioner {
    async fn generate(
        &self,
        image: &NormalizedImage,
        options: &GenerationOptions,
    ) -> Result<Vec<String>, CaptionError> {
        let image_data = encode_image(image)?;

        let messages = vec![
            ChatMessage::system(DEFAULT_SYSTEM_PROMPT),
            ChatMessage::user_with_images(caption_request(options.num_sequences), vec![image_data]),
        ];

        let completion = CompletionOptions {
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_length),
            ..Default::default()
        };

        let chat = self.provider.chat(&messages, Some(&completion));
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), chat)
            .await
            .map_err(|_| CaptionError::Generation {
                detail: format!("model call timed out after {}s", self.timeout_secs),
            })?
            .map_err(|e| CaptionError::Generation {
                detail: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        Ok(split_candidates(&response.content, options.num_sequences))
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// PNG-encode a normalized image and wrap it as a base64 attachment.
///
/// PNG over JPEG because re-encoding an already-lossy upload a second time
/// softens exactly the detail the model is being asked to describe.
pub fn encode_image(image: &NormalizedImage) -> Result<ImageData, CaptionError> {
    let rgb = image.as_rgb();
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CaptionError::Internal(format!("png encode: {e}")))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded {}x{} image → {} bytes base64", rgb.width(), rgb.height(), b64.len());

    Ok(ImageData::new(b64, "image/png"))
}

/// List scaffolding some models add despite the prompt: "1. ", "2) ", "- ", "• ".
static RE_LIST_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]\s*|[-*•]\s+)").unwrap());

/// Split a chat response into raw caption candidates.
///
/// One candidate per non-blank line, list prefixes stripped, truncated to
/// the requested count. The strings stay otherwise raw — full cleanup is
/// the next pipeline stage.
fn split_candidates(content: &str, requested: usize) -> Vec<String> {
    content
        .lines()
        .map(|line| RE_LIST_PREFIX.replace(line, "").to_string())
        .filter(|line| !line.trim().is_empty())
        .take(requested)
        .collect()
}
