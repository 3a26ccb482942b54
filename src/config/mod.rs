// Program configuration: generation parameters and credentials

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables consulted for the API key, in priority order.
const API_KEY_ENV_VARS: &[&str] = &["GHOSTPEN_API_KEY", "OPENAI_API_KEY"];

fn default_model() -> String {
    "gpt-4.1-2025-04-14".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_min_chars() -> usize {
    1200
}

fn default_max_chars() -> usize {
    1500
}

fn default_target_chars() -> usize {
    1350
}

fn default_title_max_tokens() -> u32 {
    100
}

fn default_title_temperature() -> f32 {
    0.8
}

fn default_title_timeout_secs() -> u64 {
    3
}

fn default_feature_select_min() -> usize {
    7
}

fn default_feature_select_max() -> usize {
    8
}

fn default_max_char_deviation() -> usize {
    200
}

fn default_keyword_min() -> usize {
    5
}

fn default_keyword_max() -> usize {
    10
}

/// Generation settings, persisted as JSON under the user's home directory.
///
/// The numeric caps here existed as scattered constants in earlier iterations
/// of the converter; they are configuration, not behavior, so they all live
/// in one place with serde defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the completion service. Environment variables override
    /// the stored value (see [`Config::apply_env_overrides`]).
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Hard character range for generated bodies (whitespace-stripped).
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_target_chars")]
    pub target_chars: usize,

    /// Title generation uses the same model unless overridden, with a short
    /// timeout and a little more creativity.
    #[serde(default)]
    pub title_model: Option<String>,
    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,
    #[serde(default = "default_title_temperature")]
    pub title_temperature: f32,
    #[serde(default = "default_title_timeout_secs")]
    pub title_timeout_secs: u64,

    #[serde(default = "default_feature_select_min")]
    pub feature_select_min: usize,
    #[serde(default = "default_feature_select_max")]
    pub feature_select_max: usize,
    /// Fixed seed for feature selection and title fallback choice. Unset in
    /// production; set for reproducible runs and tests.
    #[serde(default)]
    pub feature_seed: Option<u64>,

    #[serde(default = "default_max_char_deviation")]
    pub max_char_deviation: usize,
    #[serde(default = "default_keyword_min")]
    pub keyword_min: usize,
    #[serde(default = "default_keyword_max")]
    pub keyword_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
            target_chars: default_target_chars(),
            title_model: None,
            title_max_tokens: default_title_max_tokens(),
            title_temperature: default_title_temperature(),
            title_timeout_secs: default_title_timeout_secs(),
            feature_select_min: default_feature_select_min(),
            feature_select_max: default_feature_select_max(),
            feature_seed: None,
            max_char_deviation: default_max_char_deviation(),
            keyword_min: default_keyword_min(),
            keyword_max: default_keyword_max(),
        }
    }
}

impl Config {
    /// The config file path (`~/.ghostpen/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".ghostpen").join("config.json"))
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file exists. Environment overrides are always applied.
    pub fn load() -> Result<Self, String> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
                serde_json::from_str(&contents)
                    .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Persist the config to the default location.
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::default_path().ok_or("Could not determine home directory")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create config directory '{}': {}", parent.display(), e)
            })?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(&path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;
        Ok(path)
    }

    /// Replace the API key with an environment-provided one when present.
    pub fn apply_env_overrides(&mut self) {
        for var in API_KEY_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.trim().is_empty() {
                    self.api_key = value;
                    return;
                }
            }
        }
    }

    /// Model used for title calls.
    pub fn title_model(&self) -> &str {
        self.title_model.as_deref().unwrap_or(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gpt-4.1-2025-04-14");
        assert_eq!(config.min_chars, 1200);
        assert_eq!(config.max_chars, 1500);
        assert_eq!(config.target_chars, 1350);
        assert_eq!(config.feature_select_min, 7);
        assert_eq!(config.feature_select_max, 8);
        assert_eq!(config.max_char_deviation, 200);
        assert_eq!(config.keyword_min, 5);
        assert_eq!(config.keyword_max, 10);
        assert_eq!(config.title_timeout_secs, 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_key": "sk-test"}"#).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.max_tokens, 4096);
        assert!(config.feature_seed.is_none());
    }

    #[test]
    fn test_title_model_falls_back_to_body_model() {
        let mut config = Config::default();
        assert_eq!(config.title_model(), "gpt-4.1-2025-04-14");
        config.title_model = Some("gpt-4o-mini".to_string());
        assert_eq!(config.title_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.api_key = "sk-live".to_string();
        config.feature_seed = Some(99);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_key, "sk-live");
        assert_eq!(parsed.feature_seed, Some(99));
    }
}
