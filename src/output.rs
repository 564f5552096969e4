//! Output types: the cleaned caption set plus per-request statistics.

use serde::{Deserialize, Serialize};

/// Result of one caption request.
///
/// `captions` is ordered, deduplicated, and fully cleaned — ready to render.
/// Serialises directly as the web API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionOutput {
    /// Cleaned, deduplicated captions in generation order.
    pub captions: Vec<String>,
    /// Statistics about the request.
    pub stats: CaptionStats,
}

/// Statistics for one caption request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionStats {
    /// Size of the uploaded file in bytes.
    pub upload_bytes: usize,
    /// Dimensions of the decoded image before normalization.
    pub source_width: u32,
    pub source_height: u32,
    /// Dimensions actually sent to the captioner (≤ `max_dimension`).
    pub width: u32,
    pub height: u32,
    /// Raw candidates returned by the model, before cleanup and dedup.
    pub raw_candidates: usize,
    /// Distinct captions after cleanup and dedup.
    pub unique_captions: usize,
    /// Time spent in the model call.
    pub generation_ms: u64,
    /// Wall-clock time for the whole request pipeline.
    pub total_ms: u64,
}
