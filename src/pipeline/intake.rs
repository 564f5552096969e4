//! Intake validation: raw upload bytes → decoded image.
//!
//! Checks run cheapest-first: empty check, size budget, declared extension,
//! magic-byte format detection, full decode. A 15 MB upload against a 10 MB
//! budget is rejected by the length check alone — the decoder never sees it.
//!
//! Format detection trusts the bytes, not the filename: the declared
//! extension is a fast first-line check for the UI, but the codec choice
//! comes from the magic bytes so a renamed `.exe` cannot reach the decoder
//! as a "png".

use crate::config::CaptionConfig;
use crate::error::CaptionError;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One user upload, alive from submission until decode.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Raw file bytes as received.
    pub bytes: Vec<u8>,
    /// Extension declared by the client filename, if any, lowercased
    /// without the leading dot.
    pub extension: Option<String>,
}

impl UploadedAsset {
    /// Wrap upload bytes with the extension taken from a client filename.
    pub fn new(bytes: Vec<u8>, filename: Option<&str>) -> Self {
        let extension = filename
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        Self { bytes, extension }
    }

    /// Upload size in megabytes.
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / BYTES_PER_MB
    }
}

/// Validate and decode an upload.
///
/// On success the asset's bytes have been decoded into a pixel grid; the
/// caller discards the asset afterwards. Fails with:
/// - [`CaptionError::EmptyUpload`] for a zero-byte body
/// - [`CaptionError::SizeExceeded`] when over `config.max_upload_mb`,
///   before any decode work
/// - [`CaptionError::UnsupportedExtension`] when the declared extension is
///   outside `config.allowed_extensions`
/// - [`CaptionError::DecodeError`] when the bytes are not a valid image in
///   a supported codec
pub fn accept(asset: &UploadedAsset, config: &CaptionConfig) -> Result<DynamicImage, CaptionError> {
    if asset.bytes.is_empty() {
        return Err(CaptionError::EmptyUpload);
    }

    let size_mb = asset.size_mb();
    if size_mb > config.max_upload_mb as f64 {
        return Err(CaptionError::SizeExceeded {
            size_mb,
            limit_mb: config.max_upload_mb,
        });
    }

    if let Some(ref ext) = asset.extension {
        if !config.allowed_extensions.iter().any(|a| a == ext) {
            return Err(CaptionError::UnsupportedExtension {
                extension: ext.clone(),
                supported: config.supported_list(),
            });
        }
    }

    let format = detect_format(&asset.bytes)?;
    let img = image::load_from_memory_with_format(&asset.bytes, format)
        .map_err(|e| CaptionError::DecodeError {
            detail: e.to_string(),
        })?;

    debug!(
        "Accepted upload: {:.2} MB, {:?}, {}x{}",
        size_mb,
        format,
        img.width(),
        img.height()
    );

    Ok(img)
}

/// Detect the image codec from magic bytes.
///
/// Only the codecs this crate compiles decoders for are recognised;
/// anything else is a decode failure regardless of filename.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, CaptionError> {
    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        _ => Err(CaptionError::DecodeError {
            detail: "unrecognised image signature (supported codecs: png, jpeg, webp)".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .expect("png encode");
        buf
    }

    #[test]
    fn extension_comes_from_filename() {
        let a = UploadedAsset::new(vec![1], Some("Photo.JPG"));
        assert_eq!(a.extension.as_deref(), Some("jpg"));

        let b = UploadedAsset::new(vec![1], Some("noextension"));
        assert_eq!(b.extension, None);

        let c = UploadedAsset::new(vec![1], None);
        assert_eq!(c.extension, None);
    }

    #[test]
    fn empty_upload_is_rejected() {
        let asset = UploadedAsset::new(Vec::new(), Some("a.png"));
        let result = accept(&asset, &CaptionConfig::default());
        assert!(matches!(result, Err(CaptionError::EmptyUpload)));
    }

    #[test]
    fn oversize_upload_halts_before_decode() {
        let config = CaptionConfig::default(); // 10 MB budget
        // 15 MB of garbage — if the decoder ran, it would also fail, but the
        // variant must be SizeExceeded, proving the early exit.
        let asset = UploadedAsset::new(vec![0u8; 15 * 1024 * 1024], Some("big.jpg"));
        match accept(&asset, &config) {
            Err(CaptionError::SizeExceeded { size_mb, limit_mb }) => {
                assert_eq!(limit_mb, 10);
                assert!(size_mb > 14.9 && size_mb < 15.1);
            }
            other => panic!("expected SizeExceeded, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let asset = UploadedAsset::new(png_bytes(4, 4), Some("scan.tiff"));
        let result = accept(&asset, &CaptionConfig::default());
        match result {
            Err(CaptionError::UnsupportedExtension { extension, .. }) => {
                assert_eq!(extension, "tiff");
            }
            other => panic!("expected UnsupportedExtension, got {other:?}"),
        }
    }

    #[test]
    fn missing_extension_falls_through_to_magic_bytes() {
        let asset = UploadedAsset::new(png_bytes(4, 4), None);
        let img = accept(&asset, &CaptionConfig::default()).expect("valid png");
        assert_eq!((img.width(), img.height()), (4, 4));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let asset = UploadedAsset::new(vec![0x00, 0x01, 0x02, 0x03, 0x04], Some("x.png"));
        let result = accept(&asset, &CaptionConfig::default());
        assert!(matches!(result, Err(CaptionError::DecodeError { .. })));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        // Valid signature, corrupt body.
        let asset = UploadedAsset::new(
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00],
            Some("x.png"),
        );
        let result = accept(&asset, &CaptionConfig::default());
        assert!(matches!(result, Err(CaptionError::DecodeError { .. })));
    }

    #[test]
    fn detect_format_covers_supported_codecs() {
        assert_eq!(
            detect_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(
            detect_format(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ])
            .unwrap(),
            ImageFormat::WebP
        );
        // GIF is decodable by the image crate in principle, but not part of
        // the supported set here.
        assert!(detect_format(&[0x47, 0x49, 0x46, 0x38, 0x39, 0x61]).is_err());
    }
}
