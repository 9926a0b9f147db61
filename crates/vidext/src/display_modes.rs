//! Fullscreen resolutions reported to the core
//!
//! The list is resolved once per process. The display subsystem is asked
//! first; when it cannot answer (no display, headless build, query error)
//! a fixed list of common resolutions is used instead.

use crate::surface::DisplayQuery;
use std::sync::OnceLock;
use vidext_core::logging::{log, LogCategory, LogLevel};
use vidext_core::{Size2D, VidExtError, VidExtResult};

/// Used when the display subsystem cannot be queried
pub const FALLBACK_MODES: [Size2D; 9] = [
    Size2D::new(1920, 1440),
    Size2D::new(1600, 1200),
    Size2D::new(1400, 1050),
    Size2D::new(1280, 960),
    Size2D::new(1152, 864),
    Size2D::new(1024, 768),
    Size2D::new(800, 600),
    Size2D::new(640, 480),
    Size2D::new(320, 240),
];

static FULLSCREEN_MODES: OnceLock<Vec<Size2D>> = OnceLock::new();

/// A query that always fails, for builds without a display backend
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl DisplayQuery for NoDisplay {
    fn list_modes(&self) -> VidExtResult<Vec<Size2D>> {
        Err(VidExtError::SystemFailure(
            "no display subsystem available".to_string(),
        ))
    }
}

/// Ask `query` for modes, falling back to `fallback` on failure.
///
/// Display backends usually report one entry per refresh rate, so
/// duplicate sizes are collapsed (first occurrence wins) and empty sizes
/// are dropped.
pub fn resolve_modes(query: &dyn DisplayQuery, fallback: &[Size2D]) -> Vec<Size2D> {
    match query.list_modes() {
        Ok(reported) => {
            let mut modes: Vec<Size2D> = Vec::with_capacity(reported.len());
            for mode in reported {
                if mode.width == 0 || mode.height == 0 || modes.contains(&mode) {
                    continue;
                }
                modes.push(mode);
            }
            if modes.is_empty() {
                log(LogCategory::Display, LogLevel::Warn, || {
                    "Display reported no fullscreen modes, using fallback list".to_string()
                });
                fallback.to_vec()
            } else {
                log(LogCategory::Display, LogLevel::Info, || {
                    format!("Display reported {} fullscreen mode(s)", modes.len())
                });
                modes
            }
        }
        Err(e) => {
            log(LogCategory::Display, LogLevel::Warn, || e.to_string());
            fallback.to_vec()
        }
    }
}

/// Resolve the process-wide list. Only the first call queries; later calls
/// return the list computed then.
pub fn init_fullscreen_modes(query: &dyn DisplayQuery, fallback: &[Size2D]) -> &'static [Size2D] {
    FULLSCREEN_MODES.get_or_init(|| resolve_modes(query, fallback))
}

/// The process-wide list, resolving it with [`NoDisplay`] if nobody has yet.
pub fn fullscreen_modes() -> &'static [Size2D] {
    init_fullscreen_modes(&NoDisplay, &FALLBACK_MODES)
}
