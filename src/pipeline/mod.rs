//! Pipeline stages for image captioning.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a local captioning backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ normalize ──▶ generate ──▶ cleanup
//! (bytes)    (RGB, ≤max)    (VLM)      (text rules)
//! ```
//!
//! 1. [`intake`]    — validate upload size and format, decode the bytes
//! 2. [`normalize`] — canonical RGB encoding, bounded aspect-preserving resize
//! 3. [`generate`]  — the [`generate::Captioner`] boundary; the only stage
//!    with network I/O
//! 4. [`cleanup`]   — deterministic text rules fixing model quirks (markup
//!    escapes, whitespace, case, punctuation) plus candidate deduplication

pub mod cleanup;
pub mod generate;
pub mod intake;
pub mod normalize;
