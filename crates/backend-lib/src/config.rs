// ============================
// vview-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Per-connection outbound channel capacity
    pub channel_capacity: usize,
    /// Maximum accepted chat message length in characters
    pub chat_max_len: usize,
    /// Maximum accepted display-name length in characters
    pub name_max_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            channel_capacity: 32,
            chat_max_len: 2000,
            name_max_len: 100,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and `VVIEW_`-prefixed environment
    /// variables, falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VVIEW_"))
            .extract()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 3000);
        assert_eq!(settings.log_level, "info");
        assert!(settings.channel_capacity > 0);
        assert!(settings.chat_max_len >= settings.name_max_len);
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.chat_max_len, Settings::default().chat_max_len);
    }
}
