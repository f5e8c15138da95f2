use serde::{Deserialize, Serialize};

use crate::matcher::PathCase;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct MatchingConfig {
    #[serde(default)]
    pub case_insensitive: CaseMode,
    #[serde(default)]
    pub expand_home: bool,
}

/// Case policy for path comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    /// Follow the host platform.
    #[default]
    Auto,
    Always,
    Never,
}

impl CaseMode {
    pub fn resolve(self) -> PathCase {
        match self {
            CaseMode::Auto => PathCase::host(),
            CaseMode::Always => PathCase::Insensitive,
            CaseMode::Never => PathCase::Sensitive,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub validate_labels: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    /// Log to a file in the data directory rather than stderr.
    #[serde(default)]
    pub file: bool,
    /// Keep an append-only record of labels applied to sessions.
    #[serde(default)]
    pub record_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    matching: MatchingOverlay,
    #[serde(default)]
    evaluation: EvaluationOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct MatchingOverlay {
    case_insensitive: Option<CaseMode>,
    expand_home: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct EvaluationOverlay {
    validate_labels: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<LogLevel>,
    file: Option<bool>,
    record_applied: Option<bool>,
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Apply user overlay from ~/.config/path-labeler/config.toml (if exists)
    ///
    /// Every overlay key is a scalar; keys present in the overlay replace the
    /// default, omitted keys keep it.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/path-labeler/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/path-labeler/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                // Logging is configured from this file, so it is not up yet.
                eprintln!("path-labeler: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let m = overlay.matching;
        if let Some(v) = m.case_insensitive {
            self.matching.case_insensitive = v;
        }
        if let Some(v) = m.expand_home {
            self.matching.expand_home = v;
        }

        if let Some(v) = overlay.evaluation.validate_labels {
            self.evaluation.validate_labels = v;
        }

        let l = overlay.logging;
        if let Some(v) = l.level {
            self.logging.level = v;
        }
        if let Some(v) = l.file {
            self.logging.file = v;
        }
        if let Some(v) = l.record_applied {
            self.logging.record_applied = v;
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    pub(crate) fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
