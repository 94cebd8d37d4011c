// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// There are no command-line flags; everything tunable lives here.
// Missing file or missing keys fall back to the defaults below.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub debug: DebugConfig,
    pub shaders: ShaderConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "VulkanApp".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Ignored in release builds
    pub validation_layers: bool,
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            log_level: "info".to_string(),
        }
    }
}

/// Precompiled SPIR-V inputs for the pipeline setup
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/vert.spv"),
            fragment: PathBuf::from("shaders/frag.spv"),
        }
    }
}

/// Result of reading the config file. Logging isn't up yet when this is
/// produced, so `report` is called afterwards to say what happened.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when the built-in defaults are in use
    pub source: Option<PathBuf>,
    /// Why the file was ignored
    pub error: Option<anyhow::Error>,
}

impl LoadedConfig {
    pub fn report(&self) {
        match (&self.source, &self.error) {
            (_, Some(e)) => log::warn!("{:#}. Using defaults.", e),
            (Some(path), None) => log::info!("Loaded configuration from {:?}", path),
            (None, None) => log::info!("No config file, using defaults"),
        }
        log::debug!("Config: {:?}", self.config);
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> LoadedConfig {
        Self::load_or_default("config.toml")
    }

    /// Defaults when the file is absent or broken; the error is kept for reporting
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> LoadedConfig {
        let path = path.as_ref();
        match Self::load_from_path(path) {
            Ok(Some(config)) => LoadedConfig {
                config,
                source: Some(path.to_path_buf()),
                error: None,
            },
            Ok(None) => LoadedConfig {
                config: Config::default(),
                source: None,
                error: None,
            },
            Err(e) => LoadedConfig {
                config: Config::default(),
                source: None,
                error: Some(e),
            },
        }
    }

    /// `Ok(None)` when there is no file at `path`
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        Ok(Some(config))
    }

    /// Validation layers and the debug messenger only exist in development builds
    pub fn validation_enabled(&self) -> bool {
        cfg!(debug_assertions) && self.debug.validation_layers
    }

    /// Log filter from config; unknown names fall back to `Info`
    pub fn log_level(&self) -> log::LevelFilter {
        self.debug.log_level.parse().unwrap_or_else(|_| {
            eprintln!("Unknown log level '{}', using info", self.debug.log_level);
            log::LevelFilter::Info
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_window() {
        let config = Config::default();
        assert_eq!(config.window.title, "VulkanApp");
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.shaders.vertex, PathBuf::from("shaders/vert.spv"));
        assert_eq!(config.shaders.fragment, PathBuf::from("shaders/frag.spv"));
        assert!(config.debug.validation_layers);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [window]
            title = "Triangle"

            [shaders]
            vertex = "assets/v.spv"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Triangle");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.shaders.vertex, PathBuf::from("assets/v.spv"));
        assert_eq!(config.shaders.fragment, PathBuf::from("shaders/frag.spv"));
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let loaded = Config::load_or_default("definitely/not/here/config.toml");
        assert_eq!(loaded.config.window.height, 600);
        assert!(loaded.source.is_none());
        assert!(loaded.error.is_none());
        assert!(Config::load_from_path("definitely/not/here/config.toml").unwrap().is_none());
    }

    #[test]
    fn malformed_file_falls_back_and_keeps_the_error() {
        let path = std::env::temp_dir().join(format!("vulkan-app-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[window]\nwidth = 1024\ntitle = ").unwrap();
        let loaded = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        // nothing from the broken file leaks into the defaults
        assert_eq!(loaded.config.window.width, 800);
        assert!(loaded.source.is_none());
        let message = format!("{:#}", loaded.error.expect("parse error should be kept"));
        assert!(message.contains("Failed to parse config file"), "{}", message);
    }

    #[test]
    fn valid_file_records_its_source() {
        let path = std::env::temp_dir().join(format!("vulkan-app-config-ok-{}.toml", std::process::id()));
        std::fs::write(&path, "[window]\nwidth = 1024\n").unwrap();
        let loaded = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.config.window.width, 1024);
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert!(loaded.error.is_none());
    }

    struct Capture(std::sync::Mutex<Vec<String>>);

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push(format!("{} {}", record.level(), record.args()));
            }
        }
        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(std::sync::Mutex::new(Vec::new()));

    #[test]
    fn report_warns_once_logging_is_up() {
        let path = std::env::temp_dir().join(format!("vulkan-app-config-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[debug\n").unwrap();
        let loaded = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        // same order as main: load, install logger, report
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
        loaded.report();

        let lines = CAPTURE.0.lock().unwrap();
        assert!(
            lines.iter().any(|l| l.starts_with("WARN") && l.contains("Failed to parse config file")),
            "{:?}",
            lines
        );
    }

    #[test]
    fn log_level_parses_or_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        config.debug.log_level = "chatty".to_string();
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn validation_follows_build_mode() {
        let mut config = Config::default();
        assert_eq!(config.validation_enabled(), cfg!(debug_assertions));
        config.debug.validation_layers = false;
        assert!(!config.validation_enabled());
    }
}
