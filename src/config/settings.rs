//! TOML-based configuration for Job Creator.
//!
//! Supports a config file (job-creator.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! cors_origin = "http://localhost:5173"
//!
//! [auth]
//! username = "${JOB_CREATOR_USER}"
//! auth_key = "${JOB_CREATOR_KEY}"
//!
//! [delays]
//! auth_ms = 1000
//! generate_min_ms = 5000
//! generate_max_ms = 13000
//!
//! [compiler]
//! identifier_policy = "strict"
//!
//! [wizard]
//! transition_delay_ms = 500
//! request_timeout_ms = 30000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{Credentials, DEFAULT_EXPIRES_IN, DEFAULT_ISSUER};
use crate::compile::{CompileOptions, IdentifierPolicy};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub delays: DelaySettings,
    pub compiler: CompilerSettings,
    pub wizard: WizardSettings,
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; any origin when unset.
    pub cors_origin: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: None,
        }
    }
}

/// Credentials the wizard presents, and what the token endpoint reports.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Username (supports ${ENV_VAR} expansion).
    pub username: String,
    /// Auth key (supports ${ENV_VAR} expansion).
    pub auth_key: String,
    pub issuer: String,
    pub expires_in: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            username: "job-creator".to_string(),
            auth_key: "local-dev-key".to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            expires_in: DEFAULT_EXPIRES_IN,
        }
    }
}

impl AuthSettings {
    /// Credentials with environment variables expanded.
    pub fn credentials(&self) -> Result<Credentials, SettingsError> {
        Ok(Credentials::new(
            expand_env_vars(&self.username)?,
            expand_env_vars(&self.auth_key)?,
        ))
    }
}

/// Simulated server latency, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DelaySettings {
    pub auth_ms: u64,
    pub generate_min_ms: u64,
    pub generate_max_ms: u64,
    pub preview_min_ms: u64,
    pub preview_max_ms: u64,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            auth_ms: 1000,
            generate_min_ms: 5000,
            generate_max_ms: 13000,
            preview_min_ms: 20000,
            preview_max_ms: 50000,
        }
    }
}

impl DelaySettings {
    /// No simulated latency at all.
    pub fn none() -> Self {
        Self {
            auth_ms: 0,
            generate_min_ms: 0,
            generate_max_ms: 0,
            preview_min_ms: 0,
            preview_max_ms: 0,
        }
    }

    pub fn auth(&self) -> Duration {
        Duration::from_millis(self.auth_ms)
    }

    pub fn generate(&self) -> Range<u64> {
        self.generate_min_ms..self.generate_max_ms
    }

    pub fn preview(&self) -> Range<u64> {
        self.preview_min_ms..self.preview_max_ms
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.generate_min_ms > self.generate_max_ms {
            return Err(SettingsError::InvalidConfig(
                "delays.generate_min_ms exceeds delays.generate_max_ms".into(),
            ));
        }
        if self.preview_min_ms > self.preview_max_ms {
            return Err(SettingsError::InvalidConfig(
                "delays.preview_min_ms exceeds delays.preview_max_ms".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub identifier_policy: IdentifierPolicy,
}

impl CompilerSettings {
    pub fn options(&self) -> CompileOptions {
        CompileOptions::default().with_policy(self.identifier_policy)
    }
}

/// Client-side wizard timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WizardSettings {
    /// Pause between a successful generation and showing the result.
    pub transition_delay_ms: u64,
    /// Per-request timeout; 0 disables it.
    pub request_timeout_ms: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            transition_delay_ms: 500,
            request_timeout_ms: 0,
        }
    }
}

impl WizardSettings {
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl Settings {
    /// Settings with every simulated delay removed. Used by tests and the CLI.
    pub fn without_delays() -> Self {
        Self {
            delays: DelaySettings::none(),
            wizard: WizardSettings {
                transition_delay_ms: 0,
                request_timeout_ms: 0,
            },
            ..Default::default()
        }
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.delays.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `JOB_CREATOR_CONFIG`
    /// 2. `./job-creator.toml`
    /// 3. `~/.config/job-creator/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("JOB_CREATOR_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("job-creator.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("job-creator").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let name: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
            name
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
