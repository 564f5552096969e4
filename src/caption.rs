//! Top-level caption pipeline entry points.
//!
//! One upload runs one straight-line pass: intake validation → decode →
//! normalization → a single model call → text cleanup → deduplication. No
//! retries, no persistence, no partial state — any failure terminates just
//! this request and surfaces as a [`CaptionError`].

use crate::config::CaptionConfig;
use crate::error::CaptionError;
use crate::model;
use crate::output::{CaptionOutput, CaptionStats};
use crate::pipeline::generate::{Captioner, GenerationOptions, VlmCaptioner};
use crate::pipeline::{cleanup, intake, normalize};
use edgequake_llm::ProviderFactory;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Fallback model when a provider is named without a model, or the OpenAI
/// key shortcut fires. Cheap and vision-capable.
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Caption an uploaded image.
///
/// This is the primary entry point for the library. `filename` is the
/// client-declared name, used only for the extension check; the bytes are
/// what actually gets validated and decoded.
///
/// # Errors
/// - Intake failures ([`CaptionError::SizeExceeded`],
///   [`CaptionError::UnsupportedExtension`], [`CaptionError::DecodeError`],
///   [`CaptionError::EmptyUpload`]) — the model is never called
/// - [`CaptionError::CaptionerNotConfigured`] when no backend resolves
/// - [`CaptionError::Generation`] for opaque backend failures
/// - [`CaptionError::NoCaption`] when every candidate cleans down to nothing
pub async fn caption_bytes(
    bytes: &[u8],
    filename: Option<&str>,
    config: &CaptionConfig,
) -> Result<CaptionOutput, CaptionError> {
    let total_start = Instant::now();

    // ── Step 1: Intake ───────────────────────────────────────────────────
    let asset = intake::UploadedAsset::new(bytes.to_vec(), filename);
    let upload_bytes = asset.bytes.len();
    let decoded = intake::accept(&asset, config)?;
    let (source_width, source_height) = (decoded.width(), decoded.height());

    // ── Step 2: Normalize ────────────────────────────────────────────────
    let image = normalize::normalize(decoded, config.max_dimension);
    debug!(
        "Normalized {}x{} → {}x{}",
        source_width,
        source_height,
        image.width(),
        image.height()
    );

    // ── Step 3: Generate ─────────────────────────────────────────────────
    let captioner = resolve_captioner(config)?;
    let options = GenerationOptions::from_config(config);
    let generation_start = Instant::now();
    let raw = captioner.generate(&image, &options).await?;
    let generation_ms = generation_start.elapsed().as_millis() as u64;
    let raw_candidates = raw.len();

    // ── Step 4: Clean and deduplicate ────────────────────────────────────
    let cleaned: Vec<String> = raw.iter().map(|c| cleanup::clean_caption(c)).collect();
    let captions: Vec<String> = cleanup::dedup_captions(cleaned)
        .into_iter()
        .filter(|c| !cleanup::is_degenerate(c))
        .collect();

    if captions.is_empty() {
        return Err(CaptionError::NoCaption);
    }

    let stats = CaptionStats {
        upload_bytes,
        source_width,
        source_height,
        width: image.width(),
        height: image.height(),
        raw_candidates,
        unique_captions: captions.len(),
        generation_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Captioned {}x{} upload: {}/{} candidates kept, {}ms total",
        source_width, source_height, stats.unique_captions, raw_candidates, stats.total_ms
    );

    Ok(CaptionOutput { captions, stats })
}

/// Synchronous wrapper around [`caption_bytes`].
///
/// Creates a temporary tokio runtime internally.
pub fn caption_bytes_sync(
    bytes: &[u8],
    filename: Option<&str>,
    config: &CaptionConfig,
) -> Result<CaptionOutput, CaptionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CaptionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(caption_bytes(bytes, filename, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the captioner, from most-specific to least-specific.
///
/// 1. **Injected captioner** (`config.captioner`) — used as-is, bypassing
///    the process-wide cache. The path tests and custom backends take.
///
/// 2. **Process-wide cache** — on first use, a backend is built from the
///    remaining rules below and cached for the lifetime of the process
///    (see [`crate::model`]); later requests reuse it.
///
/// The build rules mirror how much the caller chose to specify:
/// a named provider (+ optional model) via `config.provider_name`, an
/// `IMG2CAPTION_PROVIDER`/`IMG2CAPTION_MODEL` environment pair, an explicit
/// preference for OpenAI when `OPENAI_API_KEY` is present, and finally full
/// provider auto-detection from the environment.
pub fn resolve_captioner(config: &CaptionConfig) -> Result<Arc<dyn Captioner>, CaptionError> {
    if let Some(ref captioner) = config.captioner {
        return Ok(Arc::clone(captioner));
    }

    model::get_or_try_init(|| build_captioner(config))
}

/// Build a VLM-backed captioner from config and environment.
fn build_captioner(config: &CaptionConfig) -> Result<Arc<dyn Captioner>, CaptionError> {
    // Named provider + model
    if let Some(ref name) = config.provider_name {
        let model_id = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return vlm_captioner(name, model_id, config.api_timeout_secs);
    }

    // Environment pair set at the execution-environment level
    if let (Ok(prov), Ok(model_id)) = (
        std::env::var("IMG2CAPTION_PROVIDER"),
        std::env::var("IMG2CAPTION_MODEL"),
    ) {
        if !prov.is_empty() && !model_id.is_empty() {
            return vlm_captioner(&prov, &model_id, config.api_timeout_secs);
        }
    }

    // Prefer OpenAI explicitly when its key is present, so users with
    // multiple provider keys get a predictable default.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model_id = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return vlm_captioner("openai", model_id, config.api_timeout_secs);
        }
    }

    // Full auto-detection
    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CaptionError::CaptionerNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider could be auto-detected from the environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or name a provider explicitly.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(VlmCaptioner::new(
        provider,
        "auto",
        config.api_timeout_secs,
    )))
}

/// Instantiate a named provider wrapped as a captioner.
fn vlm_captioner(
    provider_name: &str,
    model_id: &str,
    timeout_secs: u64,
) -> Result<Arc<dyn Captioner>, CaptionError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model_id).map_err(|e| {
        CaptionError::CaptionerNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;

    Ok(Arc::new(VlmCaptioner::new(
        provider,
        format!("{provider_name}/{model_id}"),
        timeout_secs,
    )))
}
