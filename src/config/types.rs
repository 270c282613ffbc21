//! Configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Application configuration, loaded once per monitoring session.
///
/// The session treats a loaded config as an immutable snapshot; changes on
/// disk take effect on the next start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory the bot client writes per-bot log folders into.
    pub base_log_directory: String,
    /// Whether multi-bot log folders are available (VIP feature of the
    /// bot client). When disabled, only the default folder is watched.
    pub vip_features: bool,
    /// Webhook URL used for bots without their own `webhook_url`.
    pub fallback_webhook_url: Option<String>,
    /// Per-bot configuration, keyed by bot name (log subfolder name).
    pub bots: BTreeMap<String, BotConfig>,
}

/// Configuration for a single bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Webhook URL for this bot's notifications.
    pub webhook_url: Option<String>,
    /// Script used by the launcher control plane to start this bot.
    /// Not consumed by the monitoring pipeline.
    pub launch_script: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(config.base_log_directory.is_empty());
        assert!(!config.vip_features);
        assert!(config.fallback_webhook_url.is_none());
        assert!(config.bots.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            base_log_directory = "/home/user/DreamBot/Logs"
            vip_features = true
            fallback_webhook_url = "https://discord.com/api/webhooks/fallback"

            [bots.Woodcutter1]
            webhook_url = "https://discord.com/api/webhooks/wc1"
            launch_script = "/home/user/bots/wc1.sh"

            [bots.Fisher2]
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_log_directory, "/home/user/DreamBot/Logs");
        assert!(config.vip_features);
        assert_eq!(
            config.fallback_webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/fallback")
        );
        assert_eq!(config.bots.len(), 2);
        assert_eq!(
            config.bots["Woodcutter1"].webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/wc1")
        );
        assert!(config.bots["Fisher2"].webhook_url.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str(r#"base_log_directory = "/logs""#).unwrap();
        assert_eq!(config.base_log_directory, "/logs");
        assert!(!config.vip_features);
        assert!(config.bots.is_empty());
    }
}
