//! End-to-end integration tests for img2caption.
//!
//! Most tests drive the full pipeline through the public API with a stub
//! captioner and in-memory images, so they run offline and fast. The final
//! test makes a live VLM API call and is gated behind the `E2E_ENABLED`
//! environment variable so it does not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! To include the live-provider test:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use img2caption::{
    caption_bytes, CaptionConfig, CaptionError, Captioner, GenerationOptions, NormalizedImage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Captioner stub returning fixed raw candidates, counting its calls.
struct Scripted {
    captions: Vec<String>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(captions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            captions: captions.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Captioner for Scripted {
    async fn generate(
        &self,
        _image: &NormalizedImage,
        _options: &GenerationOptions,
    ) -> Result<Vec<String>, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.captions.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Solid-color JPEG of the given dimensions, encoded in memory.
fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 120, 180]));
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 85)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("jpeg encode");
    buf
}

/// Solid-color PNG of the given dimensions, encoded in memory.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 160, 90]));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .expect("png encode");
    buf
}

fn config_with(captioner: Arc<dyn Captioner>) -> CaptionConfig {
    CaptionConfig::builder()
        .captioner(captioner)
        .build()
        .expect("valid config")
}

// ── Full-pipeline tests (stub captioner, offline) ────────────────────────────

#[tokio::test]
async fn landscape_jpeg_is_resized_and_captioned() {
    let stub = Scripted::new(&[r"a dog  running \textbf{fast}"]);
    let config = config_with(stub.clone());

    let bytes = jpeg_bytes(2000, 1000);
    let out = caption_bytes(&bytes, Some("park.jpg"), &config)
        .await
        .expect("pipeline should succeed");

    // Lanczos fit within 1024×1024, aspect preserved.
    assert_eq!(out.stats.source_width, 2000);
    assert_eq!(out.stats.source_height, 1000);
    assert_eq!(out.stats.width, 1024);
    assert_eq!(out.stats.height, 512);
    assert_eq!(out.stats.upload_bytes, bytes.len());

    // Cleanup: markup stripped, whitespace collapsed, cased, terminated.
    assert_eq!(out.captions, vec!["A dog running fast."]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn small_png_passes_through_untouched() {
    let stub = Scripted::new(&["a green square"]);
    let config = config_with(stub);

    let out = caption_bytes(&png_bytes(300, 200), Some("square.png"), &config)
        .await
        .unwrap();

    assert_eq!(out.stats.width, 300);
    assert_eq!(out.stats.height, 200);
    assert_eq!(out.captions, vec!["A green square."]);
}

#[tokio::test]
async fn candidates_are_deduplicated_in_order() {
    let stub = Scripted::new(&[
        "a city street at night",
        "A city street at night.",
        "neon signs over a wet road",
    ]);
    let config = CaptionConfig::builder()
        .captioner(stub)
        .num_sequences(3)
        .build()
        .unwrap();

    let out = caption_bytes(&png_bytes(64, 64), Some("city.png"), &config)
        .await
        .unwrap();

    assert_eq!(
        out.captions,
        vec!["A city street at night.", "Neon signs over a wet road."]
    );
    assert_eq!(out.stats.raw_candidates, 3);
    assert_eq!(out.stats.unique_captions, 2);
}

#[tokio::test]
async fn oversize_upload_is_rejected_before_the_model() {
    let stub = Scripted::new(&["unreachable"]);
    let config = config_with(stub.clone());

    // 15 MB against the default 10 MB budget.
    let result = caption_bytes(&vec![0u8; 15 * 1024 * 1024], Some("huge.jpg"), &config).await;

    match result {
        Err(CaptionError::SizeExceeded { size_mb, limit_mb }) => {
            assert_eq!(limit_mb, 10);
            assert!(size_mb > 14.9);
        }
        other => panic!("expected SizeExceeded, got {other:?}"),
    }
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0, "model must not run");
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let stub = Scripted::new(&["unreachable"]);
    let config = config_with(stub.clone());

    let result = caption_bytes(&png_bytes(16, 16), Some("animation.gif"), &config).await;

    assert!(matches!(
        result,
        Err(CaptionError::UnsupportedExtension { .. })
    ));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_image_bytes_are_a_decode_error() {
    let stub = Scripted::new(&["unreachable"]);
    let config = config_with(stub.clone());

    let result = caption_bytes(b"%PDF-1.7 not an image at all", Some("doc.png"), &config).await;

    assert!(matches!(result, Err(CaptionError::DecodeError { .. })));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_markup_candidates_surface_as_no_caption() {
    let stub = Scripted::new(&[r"{}", r"\foo", "   "]);
    let config = config_with(stub);

    let result = caption_bytes(&png_bytes(16, 16), Some("odd.png"), &config).await;
    assert!(matches!(result, Err(CaptionError::NoCaption)));
}

#[tokio::test]
async fn failing_backend_propagates_as_generation_error() {
    struct Failing;

    #[async_trait]
    impl Captioner for Failing {
        async fn generate(
            &self,
            _image: &NormalizedImage,
            _options: &GenerationOptions,
        ) -> Result<Vec<String>, CaptionError> {
            Err(CaptionError::Generation {
                detail: "backend unavailable".into(),
            })
        }
    }

    let config = config_with(Arc::new(Failing));
    let result = caption_bytes(&png_bytes(16, 16), Some("x.png"), &config).await;
    assert!(matches!(result, Err(CaptionError::Generation { .. })));
}

// ── Live-provider test (gated, makes a real API call) ────────────────────────

#[tokio::test]
async fn live_provider_captions_a_real_image() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run live e2e tests");
        return;
    }

    let config = CaptionConfig::default();
    let out = caption_bytes(&jpeg_bytes(640, 480), Some("live.jpg"), &config)
        .await
        .expect("live caption call should succeed");

    assert!(!out.captions.is_empty());
    for caption in &out.captions {
        assert!(!caption.trim().is_empty());
        assert!(
            caption.ends_with('.') || caption.ends_with('!') || caption.ends_with('?'),
            "caption must be terminated: {caption:?}"
        );
    }
    println!("Live captions: {:?}", out.captions);
}
