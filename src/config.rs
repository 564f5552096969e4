//! Configuration types for caption generation.
//!
//! All behaviour is controlled through [`CaptionConfig`], built via its
//! [`CaptionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across requests, serialise it for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A twelve-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely
//! on well-documented defaults for the rest.

use crate::error::CaptionError;
use crate::pipeline::generate::Captioner;
use std::fmt;
use std::sync::Arc;

/// Configuration for one caption pipeline.
///
/// Built via [`CaptionConfig::builder()`] or using
/// [`CaptionConfig::default()`].
///
/// # Example
/// ```rust
/// use img2caption::CaptionConfig;
///
/// let config = CaptionConfig::builder()
///     .max_upload_mb(10)
///     .max_dimension(1024)
///     .num_sequences(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CaptionConfig {
    /// Model identifier, e.g. "gpt-4.1-nano", "llava". If None, uses the
    /// provider default.
    pub model: Option<String>,

    /// Provider name (e.g. "openai", "anthropic", "ollama"). If None along
    /// with `captioner`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed captioner. Takes precedence over `provider_name` and
    /// bypasses the process-wide cached instance — the injection point for
    /// tests and custom backends.
    pub captioner: Option<Arc<dyn Captioner>>,

    /// Maximum upload size in megabytes. Default: 10.
    ///
    /// Uploads over this budget are rejected before any decode work, so a
    /// hostile or accidental 500 MB file costs one length check, nothing
    /// more.
    pub max_upload_mb: usize,

    /// Maximum post-resize dimension (width or height) in pixels. Default: 1024.
    ///
    /// Caption models look at the gist of a scene, not fine print; anything
    /// past ~1024 px adds upload bytes and decode time without changing the
    /// caption. Images already within bounds are passed through untouched.
    pub max_dimension: u32,

    /// Accepted file extensions for uploads. Default: jpg, jpeg, png, webp.
    ///
    /// Checked case-insensitively against the declared filename; the actual
    /// bytes are still verified by magic-byte detection before decoding.
    pub allowed_extensions: Vec<String>,

    /// Maximum caption length in tokens. Default: 50.
    pub max_length: usize,

    /// Beam count for beam-search backends. Default: 5.
    ///
    /// Chat-API backends have no beam-search knob and ignore this; it is
    /// forwarded so that local backends implementing [`Captioner`] can use
    /// it.
    pub num_beams: u32,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Captions benefit from a little variety — 0.7 keeps descriptions
    /// natural without drifting into invention. Lower it towards 0 for
    /// deterministic output.
    pub temperature: f32,

    /// Top-k sampling cutoff. Default: 50. Backend-dependent, see `num_beams`.
    pub top_k: u32,

    /// Nucleus (top-p) sampling cutoff. Default: 0.95. Backend-dependent.
    pub top_p: f32,

    /// Number of caption candidates requested per image. Default: 1.
    ///
    /// Candidates are cleaned and deduplicated, so asking for 3 may render
    /// fewer when the model repeats itself.
    pub num_sequences: usize,

    /// Per-generation-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            captioner: None,
            max_upload_mb: 10,
            max_dimension: 1024,
            allowed_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            max_length: 50,
            num_beams: 5,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            num_sequences: 1,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for CaptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("captioner", &self.captioner.as_ref().map(|_| "<dyn Captioner>"))
            .field("max_upload_mb", &self.max_upload_mb)
            .field("max_dimension", &self.max_dimension)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_length", &self.max_length)
            .field("num_beams", &self.num_beams)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("num_sequences", &self.num_sequences)
            .finish()
    }
}

impl CaptionConfig {
    /// Create a new builder for `CaptionConfig`.
    pub fn builder() -> CaptionConfigBuilder {
        CaptionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The supported extensions joined for display in errors and the UI.
    pub fn supported_list(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}

/// Builder for [`CaptionConfig`].
#[derive(Debug)]
pub struct CaptionConfigBuilder {
    config: CaptionConfig,
}

impl CaptionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.config.captioner = Some(captioner);
        self
    }

    pub fn max_upload_mb(mut self, mb: usize) -> Self {
        self.config.max_upload_mb = mb.max(1);
        self
    }

    pub fn max_dimension(mut self, px: u32) -> Self {
        self.config.max_dimension = px.max(64);
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_length(mut self, tokens: usize) -> Self {
        self.config.max_length = tokens.max(1);
        self
    }

    pub fn num_beams(mut self, n: u32) -> Self {
        self.config.num_beams = n.max(1);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn num_sequences(mut self, n: usize) -> Self {
        self.config.num_sequences = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CaptionConfig, CaptionError> {
        let c = &self.config;
        if c.allowed_extensions.is_empty() {
            return Err(CaptionError::InvalidConfig(
                "At least one allowed extension is required".into(),
            ));
        }
        if c.num_sequences == 0 {
            return Err(CaptionError::InvalidConfig(
                "num_sequences must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
