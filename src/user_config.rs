//! User configuration: gateway address, API key, preference storage location.
//!
//! Layered the usual way: built-in defaults, then an optional
//! `~/.config/promptdeck/config.toml`, then `GATEWAY_*` environment variables
//! (a `.env` file is honored via dotenvy in `try_main`).

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Base URL of the gateway, no trailing slash required.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Static key forwarded as `X-Internal-API-Key`. When unset the prompt
    /// tester degrades to a configuration-error screen instead of calling out.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

impl UserConfig {
    pub fn load() -> color_eyre::Result<UserConfig> {
        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name(&Self::default_config_path().to_string_lossy())
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("GATEWAY"))
            .build()?
            .try_deserialize::<UserConfig>()
            .unwrap_or_else(|_| UserConfig::default());
        Ok(cfg)
    }

    /// Default config.toml path: ~/.config/promptdeck/config.toml
    pub fn default_config_path() -> std::path::PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("promptdeck")
            .join("config.toml")
    }

    /// Where persisted preferences (selected model, rules template) live.
    pub fn prefs_path() -> std::path::PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("promptdeck")
            .join("prefs.json")
    }

    pub fn api_key_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_configured() {
        let cfg = UserConfig::default();
        assert!(!cfg.api_key_configured());

        let blank = UserConfig {
            api_key: Some("   ".to_string()),
            ..UserConfig::default()
        };
        assert!(!blank.api_key_configured());

        let set = UserConfig {
            api_key: Some("sk-test".to_string()),
            ..UserConfig::default()
        };
        assert!(set.api_key_configured());
    }
}
