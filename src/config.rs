use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Dot shape used for the nine grid elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    #[default]
    Square,
    Circle,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icon::Square => write!(f, "Square"),
            Icon::Circle => write!(f, "Circle"),
        }
    }
}

/// Animation style driving the dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    #[default]
    Fade,
    Spiral,
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Animation::Fade => write!(f, "Fade"),
            Animation::Spiral => write!(f, "Spiral"),
        }
    }
}

/// Canonical list of icon shapes with descriptions for UI display.
pub const ICONS: &[(Icon, &str)] = &[
    (Icon::Square, "Sharp-cornered dots"),
    (Icon::Circle, "Round dots"),
];

/// Canonical list of animation styles with descriptions for UI display.
pub const ANIMATIONS: &[(Animation, &str)] = &[
    (Animation::Fade, "Each dot pulses on its own randomised rhythm"),
    (Animation::Spiral, "Dots highlight one after another in a spiral"),
];

/// Demo application settings.
/// Stored in the platform config directory (`$XDG_CONFIG_HOME/dotspin/` or `%APPDATA%\dotspin\`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dot shape used by the demo spinner.
    pub icon: Icon,
    /// Animation style used by the demo spinner.
    pub animation: Animation,
    /// Fade-mode timing seed. `None` draws a fresh seed for every spinner.
    pub seed: Option<u64>,
    /// Demo window background colour (RGB).
    pub background: [u8; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icon: Icon::Square,
            animation: Animation::Spiral,
            seed: None,
            background: [255, 149, 0],
        }
    }
}

impl Config {
    /// Load config from `config.json` in the platform config directory, or return defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "No config file at {}, using defaults. Creating default config.",
                    path.display()
                );
                let config = Self::default();
                config.save();
                config
            }
        }
    }

    /// Save current config to `config.json`.
    pub fn save(&self) {
        let path = config_path();
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("Failed to write config to {}: {}", path.display(), e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize config: {}", e);
            }
        }
    }
}

fn config_path() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dotspin");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).ok();
    }
    dir.join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Icon::Circle).unwrap(), "\"circle\"");
        assert_eq!(
            serde_json::to_string(&Animation::Spiral).unwrap(),
            "\"spiral\""
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str("{\"icon\":\"circle\"}").unwrap();
        assert_eq!(config.icon, Icon::Circle);
        assert_eq!(config.animation, Animation::Spiral);
        assert_eq!(config.seed, None);
    }
}
