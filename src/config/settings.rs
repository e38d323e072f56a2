use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::util::paths::config_path;

use super::keys::{parse_key_notation, KeyCombo};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// How session tokens are drawn in the status summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusStyle {
    /// Padded tokens with per-session color groups
    #[default]
    Emphasis,
    /// Compact bracketed tokens, no color groups
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusConfig {
    /// Lower bound of the summary width, in display columns
    pub min_width: usize,
    /// Upper bound as a fraction of the available width
    pub max_width_ratio: f64,
    /// Glyph drawn in front of each session number
    pub icon: String,
    pub style: StatusStyle,
    /// Whether the summary starts out visible
    pub visible: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            min_width: 20,
            max_width_ratio: 0.5,
            icon: "●".to_string(),
            style: StatusStyle::Emphasis,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptConfig {
    pub width_ratio: f64,
    pub height_ratio: f64,
    /// Press Enter in the session after delivering a draft
    pub submit_with_enter: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            width_ratio: 0.6,
            height_ratio: 0.4,
            submit_with_enter: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeysConfig {
    /// Command prefix in key notation
    pub prefix: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            prefix: "C-a".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Agent CLI started for every session
    pub executable: String,
    /// Arguments placed before the per-variant arguments
    pub extra_args: Vec<String>,
    pub status: StatusConfig,
    pub prompt: PromptConfig,
    pub keys: KeysConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: "claude".to_string(),
            extra_args: Vec::new(),
            status: StatusConfig::default(),
            prompt: PromptConfig::default(),
            keys: KeysConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlStatusConfig {
    min_width: Option<usize>,
    max_width_ratio: Option<f64>,
    icon: Option<String>,
    style: Option<StatusStyle>,
    visible: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlPromptConfig {
    width_ratio: Option<f64>,
    height_ratio: Option<f64>,
    submit_with_enter: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TomlKeysConfig {
    prefix: Option<String>,
}

/// TOML representation of the config file; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
struct TomlConfig {
    executable: Option<String>,
    extra_args: Option<Vec<String>>,
    status: Option<TomlStatusConfig>,
    prompt: Option<TomlPromptConfig>,
    keys: Option<TomlKeysConfig>,
}

fn ratio(value: f64, field: &str, fallback: f64) -> f64 {
    if value > 0.0 && value <= 1.0 {
        value
    } else {
        warn!(field, value, "ratio outside (0, 1], keeping default");
        fallback
    }
}

impl Config {
    /// Load configuration from the data directory, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from `path`; unreadable or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        let mut config = Config::default();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no config file, using defaults");
                return config;
            }
        };

        match toml::from_str::<TomlConfig>(&contents) {
            Ok(toml_config) => config.merge(toml_config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
            }
        }

        config
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(executable) = toml_config.executable {
            self.executable = executable;
        }
        if let Some(extra_args) = toml_config.extra_args {
            self.extra_args = extra_args;
        }

        if let Some(status) = toml_config.status {
            let defaults = StatusConfig::default();
            if let Some(min_width) = status.min_width {
                self.status.min_width = min_width;
            }
            if let Some(max_width_ratio) = status.max_width_ratio {
                self.status.max_width_ratio =
                    ratio(max_width_ratio, "status.max_width_ratio", defaults.max_width_ratio);
            }
            if let Some(icon) = status.icon.filter(|icon| !icon.is_empty()) {
                self.status.icon = icon;
            }
            if let Some(style) = status.style {
                self.status.style = style;
            }
            if let Some(visible) = status.visible {
                self.status.visible = visible;
            }
        }

        if let Some(prompt) = toml_config.prompt {
            let defaults = PromptConfig::default();
            if let Some(width_ratio) = prompt.width_ratio {
                self.prompt.width_ratio =
                    ratio(width_ratio, "prompt.width_ratio", defaults.width_ratio);
            }
            if let Some(height_ratio) = prompt.height_ratio {
                self.prompt.height_ratio =
                    ratio(height_ratio, "prompt.height_ratio", defaults.height_ratio);
            }
            if let Some(submit_with_enter) = prompt.submit_with_enter {
                self.prompt.submit_with_enter = submit_with_enter;
            }
        }

        if let Some(prefix) = toml_config.keys.and_then(|keys| keys.prefix) {
            match parse_key_notation(&prefix) {
                Ok(_) => self.keys.prefix = prefix,
                Err(e) => warn!(prefix = %prefix, error = %e, "invalid prefix key, keeping default"),
            }
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &PathBuf) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(error = %e, "failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            warn!(error = %e, "failed to write default config");
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// The parsed command prefix
    pub fn prefix_key(&self) -> KeyCombo {
        parse_key_notation(&self.keys.prefix).unwrap_or_else(|_| {
            KeyCombo::new(
                crossterm::event::KeyCode::Char('a'),
                crossterm::event::KeyModifiers::CONTROL,
            )
        })
    }
}
