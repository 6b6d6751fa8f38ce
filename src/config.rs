//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3000,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Where the collaborators live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorMode {
    Http,
    Memory,
}

impl std::str::FromStr for CollaboratorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue(format!(
                "COLLABORATOR_MODE must be 'http' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Base URLs of the six collaborators
#[derive(Debug, Clone)]
pub struct CollaboratorEndpoints {
    pub policy: Url,
    pub cost: Url,
    pub analytics: Url,
    pub config: Url,
    pub schema: Url,
    pub dashboard: Url,
}

/// Collaborator configuration
#[derive(Debug, Clone)]
pub struct CollaboratorSettings {
    pub mode: CollaboratorMode,
    /// Only present in HTTP mode
    pub endpoints: Option<CollaboratorEndpoints>,
    pub timeout: Duration,
    /// JSON document preloading the in-memory collaborators
    pub seed: Option<PathBuf>,
}

impl Default for CollaboratorSettings {
    fn default() -> Self {
        Self {
            mode: CollaboratorMode::Memory,
            endpoints: None,
            timeout: Duration::from_secs(10),
            seed: None,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub service_name: String,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub collaborators: CollaboratorSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Service name alone, for commands that must answer without a full configuration
    pub fn load_service_name() -> String {
        let _ = dotenvy::dotenv();
        Self::service_name_from(|key| std::env::var(key).ok())
    }

    pub fn service_name_from<F>(var: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        var("SERVICE_NAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: var("HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        let cors = CorsConfig {
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let mode = match var("COLLABORATOR_MODE") {
            Some(m) => m.parse()?,
            None => CollaboratorMode::Memory,
        };

        let timeout = match var("COLLABORATOR_TIMEOUT_SECS") {
            Some(t) => Duration::from_secs(t.parse().map_err(|_| {
                ConfigError::InvalidValue(format!("COLLABORATOR_TIMEOUT_SECS is not a number: {}", t))
            })?),
            None => CollaboratorSettings::default().timeout,
        };

        let endpoints = match mode {
            CollaboratorMode::Memory => None,
            CollaboratorMode::Http => Some(CollaboratorEndpoints {
                policy: Self::collaborator_url(&var, "POLICY_URL")?,
                cost: Self::collaborator_url(&var, "COST_URL")?,
                analytics: Self::collaborator_url(&var, "ANALYTICS_URL")?,
                config: Self::collaborator_url(&var, "CONFIG_URL")?,
                schema: Self::collaborator_url(&var, "SCHEMA_URL")?,
                dashboard: Self::collaborator_url(&var, "DASHBOARD_URL")?,
            }),
        };

        Ok(Self {
            service_name: Self::service_name_from(&var),
            server,
            cors,
            collaborators: CollaboratorSettings {
                mode,
                endpoints,
                timeout,
                seed: var("COLLABORATOR_SEED").map(PathBuf::from),
            },
        })
    }

    /// Parse a collaborator base URL (http:// or https://)
    fn collaborator_url<F>(var: &F, key: &str) -> Result<Url, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))?;
        let mut url = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidValue(format!("{} is not a valid URL: {}", key, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(format!(
                "{} must use http or https, got {}",
                key,
                url.scheme()
            )));
        }

        // Relative joins replace the last segment unless the path ends in '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}
