//! Error types for the img2caption library.
//!
//! Every variant here terminates exactly one caption request; nothing is
//! fatal to the process. The web layer maps each variant to an HTTP status
//! and a user-facing message, the pipeline simply propagates with `?`.
//!
//! The intake variants (`SizeExceeded`, `UnsupportedExtension`,
//! `DecodeError`, `EmptyUpload`) fire before any model work happens, so a
//! rejected upload never costs a provider call.

use thiserror::Error;

/// All errors returned by the img2caption library.
#[derive(Debug, Error)]
pub enum CaptionError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// Upload is larger than the configured size budget.
    #[error("Upload is {size_mb:.1} MB, which exceeds the {limit_mb} MB limit")]
    SizeExceeded { size_mb: f64, limit_mb: usize },

    /// Declared file extension is not in the supported set.
    #[error("Unsupported file extension '.{extension}' (supported: {supported})")]
    UnsupportedExtension {
        extension: String,
        supported: String,
    },

    /// Bytes are not a valid image in a supported codec.
    #[error("Could not decode image: {detail}")]
    DecodeError { detail: String },

    /// Upload body was empty.
    #[error("Upload is empty")]
    EmptyUpload,

    // ── Generation errors ─────────────────────────────────────────────────
    /// Opaque failure from the captioning backend.
    #[error("Caption generation failed: {detail}")]
    Generation { detail: String },

    /// The model answered, but every candidate cleaned down to nothing.
    #[error("The model produced no usable caption for this image")]
    NoCaption,

    /// No captioner could be resolved (missing API key etc.).
    #[error("Captioner '{provider}' is not configured.\n{hint}")]
    CaptionerNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaptionError {
    /// True when the failure was caused by the upload itself rather than
    /// the server or the model — the user can fix it by submitting a
    /// different file.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CaptionError::SizeExceeded { .. }
                | CaptionError::UnsupportedExtension { .. }
                | CaptionError::DecodeError { .. }
                | CaptionError::EmptyUpload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_exceeded_display() {
        let e = CaptionError::SizeExceeded {
            size_mb: 15.2,
            limit_mb: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("15.2"), "got: {msg}");
        assert!(msg.contains("10 MB"), "got: {msg}");
    }

    #[test]
    fn unsupported_extension_display() {
        let e = CaptionError::UnsupportedExtension {
            extension: "tiff".into(),
            supported: "jpg, jpeg, png, webp".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".tiff"));
        assert!(msg.contains("webp"));
    }

    #[test]
    fn decode_error_display() {
        let e = CaptionError::DecodeError {
            detail: "unrecognised image signature".into(),
        };
        assert!(e.to_string().contains("unrecognised image signature"));
    }

    #[test]
    fn intake_errors_are_client_errors() {
        assert!(CaptionError::EmptyUpload.is_client_error());
        assert!(CaptionError::SizeExceeded {
            size_mb: 11.0,
            limit_mb: 10
        }
        .is_client_error());
        assert!(!CaptionError::NoCaption.is_client_error());
        assert!(!CaptionError::Generation {
            detail: "boom".into()
        }
        .is_client_error());
    }
}
