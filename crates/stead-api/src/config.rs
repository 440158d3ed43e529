use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration, environment-driven with local-dev defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address (`STEAD_API_BIND`)
    pub bind_addr: String,
    /// SQLite file for staging data (`STEAD_API_DB`)
    pub db_path: PathBuf,
    /// Directory uploaded media lands in (`STEAD_API_MEDIA_DIR`)
    pub media_dir: PathBuf,
    /// Public base URL media links are built from (`STEAD_API_PUBLIC_URL`)
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr =
            env::var("STEAD_API_BIND").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
        let db_path = env::var_os("STEAD_API_DB")
            .map_or_else(|| PathBuf::from("stead-api.db"), PathBuf::from);
        let media_dir = env::var_os("STEAD_API_MEDIA_DIR")
            .map_or_else(|| PathBuf::from("media"), PathBuf::from);
        let public_base_url = env::var("STEAD_API_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{bind_addr}"));

        let config = Self {
            bind_addr,
            db_path,
            media_dir,
            public_base_url,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("bind address must not be empty".into()));
        }
        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(
                "public base URL must include http:// or https://".into(),
            ));
        }
        Ok(())
    }

    /// Public URL for an uploaded media object.
    #[must_use]
    pub fn media_url(&self, key: &str) -> String {
        format!("{}/media/{key}", self.public_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn media_url_joins_cleanly() {
        let config = AppConfig {
            bind_addr: "127.0.0.1:8787".to_string(),
            db_path: PathBuf::from("x.db"),
            media_dir: PathBuf::from("media"),
            public_base_url: "http://sites.example.com/".to_string(),
        };
        assert_eq!(
            config.media_url("abc.png"),
            "http://sites.example.com/media/abc.png"
        );
    }

    #[test]
    fn validate_rejects_bad_public_url() {
        let config = AppConfig {
            bind_addr: "127.0.0.1:8787".to_string(),
            db_path: PathBuf::from("x.db"),
            media_dir: PathBuf::from("media"),
            public_base_url: "sites.example.com".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
