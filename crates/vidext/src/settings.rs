use crate::adapter::DEFAULT_CAPTION_PREFIX;
use crate::display_modes::FALLBACK_MODES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vidext_core::logging::{log, LogCategory, LogConfig, LogLevel};
use vidext_core::{GlFormat, Size2D};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Text placed before the ROM name in the window caption
    pub caption_prefix: String,
    /// "off", "error", "warn", "info", "debug" or "trace"
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    /// Maximum log lines per second per category
    pub rate_limit: usize,
    /// Path to the Mupen64Plus core shared library
    pub core_library: Option<PathBuf>,
    /// Reported when the display cannot be queried
    pub fallback_modes: Vec<Size2D>,
    /// GL format requested before the first context is created
    pub gl: GlFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            caption_prefix: DEFAULT_CAPTION_PREFIX.to_string(),
            log_level: "warn".to_string(),
            log_file: None,
            rate_limit: 60,
            core_library: None,
            fallback_modes: FALLBACK_MODES.to_vec(),
            gl: GlFormat::default(),
        }
    }
}

impl Settings {
    /// `vidext.json` next to the executable
    pub fn default_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("vidext.json");
        path
    }

    /// Load settings from `path`, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log(LogCategory::Core, LogLevel::Warn, || {
                        format!(
                            "Failed to parse {}: {}. Using defaults.",
                            path.display(),
                            e
                        )
                    });
                    Self::default()
                }
            },
            // Missing file is the normal first-run case
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    /// Parsed `log_level`, `None` when the string is not a level
    pub fn level(&self) -> Option<LogLevel> {
        LogLevel::from_str(&self.log_level)
    }

    /// Push the logging fields into the global [`LogConfig`]
    pub fn apply_logging(&self) -> std::io::Result<()> {
        let config = LogConfig::global();
        match self.level() {
            Some(level) => config.set_global_level(level),
            None => log(LogCategory::Core, LogLevel::Warn, || {
                format!("Unknown log level '{}', keeping current", self.log_level)
            }),
        }
        config.set_rate_limit(self.rate_limit);
        match &self.log_file {
            Some(path) => config.set_log_file(path.clone())?,
            None => config.clear_log_file(),
        }
        Ok(())
    }

    /// Fallback list to use, never empty
    pub fn effective_fallback_modes(&self) -> &[Size2D] {
        if self.fallback_modes.is_empty() {
            &FALLBACK_MODES
        } else {
            &self.fallback_modes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.caption_prefix, "Mupen64Plus");
        assert_eq!(settings.level(), Some(LogLevel::Warn));
        assert_eq!(settings.fallback_modes.len(), 9);
        assert_eq!(settings.core_library, None);
        assert_eq!(settings.gl, GlFormat::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"caption_prefix": "N64", "gl": {"alpha_size": 8}}"#)
                .unwrap();
        assert_eq!(settings.caption_prefix, "N64");
        assert_eq!(settings.gl.alpha_size, 8);
        assert_eq!(settings.gl.depth_size, GlFormat::default().depth_size);
        assert_eq!(settings.rate_limit, 60);
    }

    #[test]
    fn test_settings_save_load() {
        let test_dir = std::env::temp_dir().join(format!("vidext_settings_{}", std::process::id()));
        fs::create_dir_all(&test_dir).unwrap();
        let path = test_dir.join("vidext.json");

        let settings = Settings {
            caption_prefix: "Test".to_string(),
            core_library: Some(PathBuf::from("/usr/lib/libmupen64plus.so.2")),
            fallback_modes: vec![Size2D::new(640, 480)],
            ..Default::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);

        fs::remove_dir_all(&test_dir).unwrap();
    }

    #[test]
    fn test_missing_or_broken_file_gives_defaults() {
        let missing = std::env::temp_dir().join("vidext_settings_does_not_exist.json");
        assert_eq!(Settings::load_from(&missing), Settings::default());

        let broken = std::env::temp_dir().join(format!("vidext_broken_{}.json", std::process::id()));
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&broken), Settings::default());
        fs::remove_file(&broken).unwrap();
    }

    #[test]
    fn test_empty_fallback_list_is_replaced() {
        let settings = Settings {
            fallback_modes: Vec::new(),
            ..Default::default()
        };
        assert_eq!(settings.effective_fallback_modes(), &FALLBACK_MODES[..]);
    }
}
