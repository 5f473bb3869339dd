use crate::types::notification::NotificationDefaults;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid origin '{origin}': {source}")]
    Origin {
        origin: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin the worker is served from; notification urls resolve against it.
    pub origin: String,
    pub api: ApiConfig,
    pub worker: WorkerConfig,
    pub cache: CacheConfig,
    pub notifications: NotificationDefaults,
    pub relay: RelayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5173".to_string(),
            api: ApiConfig::default(),
            worker: WorkerConfig::default(),
            cache: CacheConfig::default(),
            notifications: NotificationDefaults::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.origin).map_err(|source| ConfigError::Origin {
            origin: self.origin.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Resolved against the worker origin, not the API base.
    pub quick_complete_path: String,
    pub session_cookie: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            quick_complete_path: "/api/quick-complete".to_string(),
            session_cookie: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub script_url: String,
    pub scope: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            script_url: "/sw.js".to_string(),
            scope: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Version tag; bumping it purges every older cache on activation.
    pub name: String,
    pub offline_url: String,
    pub manifest: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "sankalp-v1".to_string(),
            offline_url: "/offline.html".to_string(),
            manifest: vec![
                "/".to_string(),
                "/offline.html".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
                "/icons/badge-72x72.png".to_string(),
            ],
        }
    }
}

/// VAPID credentials for talking to the push relay directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
}
