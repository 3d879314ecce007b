use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::types::Provider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Unset means the upstream call is bounded only by the transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

// Defaults
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> Provider { Provider::OpenAI }
fn default_max_prompt_chars() -> usize { 4000 }
fn default_relay_url() -> String { "http://localhost:3000/api/prompt".to_string() }
fn default_greeting() -> String { "How can I help you today?".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            greeting: default_greeting(),
        }
    }
}

impl Config {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut config = match Self::find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        };

        config.apply_overrides(|key| env::var(key).ok())?;

        Ok(config)
    }

    fn find_config_file() -> Option<String> {
        if let Ok(path) = env::var("RELAYCHAT_CONFIG") {
            return Some(path);
        }

        let home_config = format!(
            "{}/.config/relaychat/config.toml",
            env::var("HOME").unwrap_or_default()
        );
        let locations = ["./relaychat.toml", "./config.toml", home_config.as_str()];

        locations
            .iter()
            .find(|path| Path::new(path).exists())
            .map(|path| path.to_string())
    }

    fn from_file(path: &str) -> Result<Self> {
        #[cfg(unix)]
        Self::validate_file_permissions(path)?;

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&content, |key| env::var(key).ok())
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Parse TOML after `${VAR}` substitution
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let content = Self::substitute_env_vars(content, lookup);
        Ok(toml::from_str(&content)?)
    }

    /// Substitute ${VAR_NAME} with looked-up values, unknown names become empty.
    /// Substituted values are inserted verbatim and never rescanned.
    fn substitute_env_vars(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            let Some(end) = rest[start..].find('}') else {
                break;
            };
            let var_name = &rest[start + 2..start + end];
            result.push_str(&rest[..start]);
            result.push_str(&lookup(var_name).unwrap_or_default());
            rest = &rest[start + end + 1..];
        }

        result.push_str(rest);
        result
    }

    /// Environment variables win over file values
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            self.upstream.api_key = Some(key);
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }

        if let Some(name) = lookup("RELAYCHAT_PROVIDER") {
            self.upstream.provider = Provider::from_str(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown provider in RELAYCHAT_PROVIDER: {}", name))?;
        }

        if let Some(model) = lookup("RELAYCHAT_MODEL").filter(|m| !m.is_empty()) {
            self.upstream.model = Some(model);
        }

        if let Some(url) = lookup("RELAYCHAT_RELAY_URL").filter(|u| !u.is_empty()) {
            self.client.relay_url = url;
        }

        Ok(())
    }

    /// Checks the relay needs before serving
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_prompt_chars == 0 {
            anyhow::bail!("limits.max_prompt_chars must be greater than zero");
        }

        match self.upstream.provider {
            Provider::OpenAI => {
                if self.upstream.api_key.as_deref().is_none_or(str::is_empty) {
                    anyhow::bail!(
                        "OpenAI provider selected but no API key configured (set OPENAI_API_KEY)"
                    );
                }
            }
            Provider::Ollama => {
                // Local models need no credential
                tracing::debug!("Using Ollama upstream, no API key required");
            }
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate config file permissions (Unix only)
    #[cfg(unix)]
    fn validate_file_permissions(path: &str) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for config file: {}", path))?;
        let mode = metadata.permissions().mode();

        // The file may hold the upstream API key
        if mode & 0o044 != 0 {
            tracing::warn!(
                "⚠️  Config file {} has insecure permissions: {:o} (recommended: chmod 600)",
                path,
                mode & 0o777
            );
        }

        if mode & 0o022 != 0 {
            anyhow::bail!(
                "Config file {} is writable by group or others (mode: {:o}). Run: chmod 600 {}",
                path,
                mode & 0o777,
                path
            );
        }

        Ok(())
    }
}
