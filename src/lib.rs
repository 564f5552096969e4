//! # img2caption
//!
//! Generate natural-language captions for images using Vision Language
//! Models (VLMs).
//!
//! ## Why this crate?
//!
//! Producing a good caption is the model's job; everything around it is
//! not. Uploads arrive oversized, in the wrong color encoding, or not as
//! images at all; model output arrives with markup droppings, ragged
//! whitespace, and duplicate candidates. This crate owns that glue — strict
//! intake validation, deterministic normalization, and deterministic text
//! cleanup — and treats the model itself as an opaque, swappable capability.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload bytes
//!  │
//!  ├─ 1. Intake     size budget, extension, magic bytes, decode
//!  ├─ 2. Normalize  RGB8, both dimensions ≤ max (Lanczos, aspect kept)
//!  ├─ 3. Generate   one call to gpt-4.1-nano / claude / llava / …
//!  ├─ 4. Cleanup    strip markup, collapse whitespace, case, punctuation
//!  └─ 5. Dedup      first occurrence wins, order preserved
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2caption::{caption_bytes, CaptionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = CaptionConfig::default();
//!     let bytes = std::fs::read("photo.jpg")?;
//!     let output = caption_bytes(&bytes, Some("photo.jpg"), &config).await?;
//!     for caption in &output.captions {
//!         println!("{caption}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `img2caption` web UI binary (axum + clap + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! img2caption = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod caption;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use caption::{caption_bytes, caption_bytes_sync, resolve_captioner};
pub use config::{CaptionConfig, CaptionConfigBuilder};
pub use error::CaptionError;
pub use output::{CaptionOutput, CaptionStats};
pub use pipeline::cleanup::{clean_caption, dedup_captions};
pub use pipeline::generate::{Captioner, GenerationOptions, VlmCaptioner};
pub use pipeline::intake::UploadedAsset;
pub use pipeline::normalize::{normalize, NormalizedImage};
