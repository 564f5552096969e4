//! Process-wide captioner cache.
//!
//! Building a captioner can be expensive (provider auto-detection, API key
//! lookup, client construction), so the resolved instance is held in a
//! process-wide singleton: initialized exactly once, read-only afterwards,
//! shared across sequential requests. There is no reinitialization path —
//! changing the model means restarting the process.
//!
//! Callers that pass `CaptionConfig::captioner` bypass this cache entirely;
//! that is the injection point for tests.

use crate::error::CaptionError;
use crate::pipeline::generate::Captioner;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

static GLOBAL_CAPTIONER: OnceCell<Arc<dyn Captioner>> = OnceCell::new();

/// Install a captioner as the process-wide instance.
///
/// Fails if one is already installed — there is deliberately no swap path.
pub fn install(captioner: Arc<dyn Captioner>) -> Result<(), CaptionError> {
    let name = captioner.name().to_string();
    GLOBAL_CAPTIONER
        .set(captioner)
        .map_err(|_| CaptionError::Internal("captioner already initialized".into()))?;
    info!("Installed process-wide captioner: {}", name);
    Ok(())
}

/// The cached instance, or build-and-cache via `init` on first use.
///
/// `init` runs at most once per process; concurrent callers during the
/// first request all observe the same instance.
pub fn get_or_try_init<F>(init: F) -> Result<Arc<dyn Captioner>, CaptionError>
where
    F: FnOnce() -> Result<Arc<dyn Captioner>, CaptionError>,
{
    GLOBAL_CAPTIONER.get_or_try_init(init).cloned()
}

/// The cached instance, if one has been installed or lazily built.
pub fn installed() -> Option<Arc<dyn Captioner>> {
    GLOBAL_CAPTIONER.get().cloned()
}
