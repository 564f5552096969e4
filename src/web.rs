//! Web surface: a single-page upload form and the caption API.
//!
//! One router, three routes:
//! - `GET /` — the upload page (inline HTML, no asset pipeline)
//! - `POST /api/caption` — multipart upload → JSON [`crate::output::CaptionOutput`]
//! - `GET /health` — liveness probe
//!
//! Every pipeline error is recovered here: mapped to an HTTP status and a
//! JSON `{"error": …}` body, never a crashed request. The handler is a
//! plain function call into [`crate::caption::caption_bytes`] per incoming
//! request — no background tasks, no shared mutable state beyond the
//! read-only config and the process-wide captioner cache.

use crate::caption::caption_bytes;
use crate::config::CaptionConfig;
use crate::error::CaptionError;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct AppState {
    config: Arc<CaptionConfig>,
}

/// Build the application router.
pub fn router(config: CaptionConfig) -> Router {
    let body_limit = framework_body_limit(config.max_upload_mb);
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/caption", post(caption_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, config: CaptionConfig) -> Result<(), CaptionError> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CaptionError::Internal(format!("bind {addr}: {e}")))?;

    info!("img2caption listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| CaptionError::Internal(format!("server: {e}")))
}

/// Framework body cap, held above the validator budget.
///
/// The intake validator owns the size verdict; the framework cap only
/// exists so an absurd upload cannot buffer unbounded. Keeping it above
/// `max_upload_mb` means a 15 MB file against a 10 MB budget reaches the
/// validator and surfaces as `SizeExceeded`, not a bare framework 413.
fn framework_body_limit(max_upload_mb: usize) -> usize {
    (max_upload_mb * 2 + 4) * 1024 * 1024
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn caption_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("malformed multipart body: {e}"),
                )
            }
        };

        if field.name() == Some("image") {
            let filename = field.file_name().map(|s| s.to_string());
            match field.bytes().await {
                Ok(bytes) => upload = Some((bytes.to_vec(), filename)),
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        &format!("failed to read upload: {e}"),
                    )
                }
            }
        }
    }

    let Some((bytes, filename)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "missing 'image' form field");
    };

    match caption_bytes(&bytes, filename.as_deref(), &state.config).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => error_response(status_for(&e), &e.to_string()),
    }
}

// ── Error mapping ────────────────────────────────────────────────────────

/// HTTP status for each pipeline failure.
fn status_for(err: &CaptionError) -> StatusCode {
    match err {
        CaptionError::SizeExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        CaptionError::UnsupportedExtension { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        CaptionError::DecodeError { .. } | CaptionError::EmptyUpload => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CaptionError::CaptionerNotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CaptionError::Generation { .. } | CaptionError::NoCaption => StatusCode::BAD_GATEWAY,
        CaptionError::InvalidConfig(_) | CaptionError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// ── Page template ────────────────────────────────────────────────────────

/// Fill the config-dependent placeholders in the page template.
fn render_index(config: &CaptionConfig) -> String {
    let accept = config
        .allowed_extensions
        .iter()
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(",");

    INDEX_HTML
        .replace("__ACCEPT__", &accept)
        .replace("__EXTS__", &config.supported_list())
        .replace("__MAX_MB__", &config.max_upload_mb.to_string())
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Image Caption Generator</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #1e293b; }
  h1 { font-size: 1.5rem; }
  .hint { color: #64748b; font-size: 0.9rem; }
  #preview { max-width: 100%; margin: 1rem 0; border-radius: 8px; display: none; }
  button { background: #3b82f6; color: white; border: none; border-radius: 6px; padding: 0.6rem 1.2rem; font-size: 1rem; cursor: pointer; }
  button:disabled { background: #94a3b8; cursor: wait; }
  .caption-box { background: #f8fafc; border-left: 4px solid #3b82f6; border-radius: 8px; padding: 1rem; margin: 1rem 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
  #error { color: #dc2626; margin: 1rem 0; }
  #stats { color: #64748b; font-size: 0.85rem; }
</style>
</head>
<body>
<h1>&#10024; Image Caption Generator</h1>
<p class="hint">Supported: __EXTS__ &middot; Max size: __MAX_MB__ MB</p>
<input type="file" id="file" accept="__ACCEPT__">
<img id="preview" alt="preview">
<div><button id="go" disabled>Generate Captions</button></div>
<div id="error"></div>
<div id="captions"></div>
<p id="stats"></p>
<script>
  const file = document.getElementById('file');
  const go = document.getElementById('go');
  const preview = document.getElementById('preview');
  const errBox = document.getElementById('error');
  const capBox = document.getElementById('captions');
  const stats = document.getElementById('stats');

  file.addEventListener('change', () => {
    errBox.textContent = '';
    capBox.innerHTML = '';
    stats.textContent = '';
    const f = file.files[0];
    go.disabled = !f;
    if (f) {
      preview.src = URL.createObjectURL(f);
      preview.style.display = 'block';
    } else {
      preview.style.display = 'none';
    }
  });

  go.addEventListener('click', async () => {
    const f = file.files[0];
    if (!f) return;
    go.disabled = true;
    go.textContent = 'Analyzing image…';
    errBox.textContent = '';
    capBox.innerHTML = '';
    try {
      const form = new FormData();
      form.append('image', f, f.name);
      const resp = await fetch('/api/caption', { method: 'POST', body: form });
      const body = await resp.json();
      if (!resp.ok) {
        errBox.textContent = body.error || ('Request failed (' + resp.status + ')');
        return;
      }
      body.captions.forEach((c, i) => {
        const div = document.createElement('div');
        div.className = 'caption-box';
        div.textContent = (i + 1) + '. ' + c;
        capBox.appendChild(div);
      });
      const s = body.stats;
      stats.textContent = s.width + '×' + s.height + ' px · ' + s.total_ms + ' ms';
    } catch (e) {
      errBox.textContent = 'Request failed: ' + e;
    } finally {
      go.disabled = false;
      go.textContent = 'Generate Captions';
    }
  });
</script>
</body>
</html>
"#;
