//! Layered TOML configuration for Relay.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use relay_mcp::McpServerConfig;
use relay_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default OpenAI API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The default max tokens for a response.
pub const DEFAULT_MAX_TOKENS: u32 = 2024;

/// Environment variables checked for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "OPENAI_KEY"];

/// Resolved configuration for a Relay session.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
    pub server: McpServerConfig,
    pub config_dir: PathBuf,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_base_url", &self.api_base_url)
            .field("server", &self.server)
            .field("config_dir", &self.config_dir)
            .finish()
    }
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub server: Option<McpServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// Replaces the server command; `server_args` then replace its arguments.
    pub server_command: Option<String>,
    pub server_args: Vec<String>,
}

impl RelayConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.relay/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::load_from(overrides, config_dir(), |key| std::env::var(key).ok())
    }

    /// Same as [`RelayConfig::load`], with the config directory and the
    /// environment supplied by the caller.
    pub fn load_from<F>(
        overrides: CliOverrides,
        config_dir: PathBuf,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = load_settings_file(&config_dir.join("config.toml"));
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // Resolve API key: CLI > env > config file
        let api_key = overrides
            .api_key
            .or_else(|| API_KEY_VARS.iter().find_map(|&var| env(var)))
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: "api_key (set OPENAI_API_KEY or add to ~/.relay/config.toml)".into(),
            })?;

        // Resolve model
        let model = overrides
            .model
            .or_else(|| env("RELAY_MODEL"))
            .or(settings.api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        // Resolve max tokens
        let max_tokens = overrides
            .max_tokens
            .or(settings.api.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_tokens".into(),
                message: "must be greater than zero".into(),
            });
        }

        // Resolve API base URL
        let api_base_url = env("OPENAI_BASE_URL")
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let server = resolve_server(
            settings.server,
            overrides.server_command,
            overrides.server_args,
        );
        if server.command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "server.command".into(),
                message: "must not be empty".into(),
            });
        }

        Ok(RelayConfig {
            api_key,
            model,
            max_tokens,
            api_base_url,
            server,
            config_dir,
        })
    }
}

/// The tool server the CLI flags and config file select, without resolving
/// the rest of the configuration. Used to name the server when loading fails.
pub fn configured_server(overrides: &CliOverrides) -> McpServerConfig {
    server_from(overrides, &config_dir())
}

/// Same as [`configured_server`], reading the config file from `config_dir`.
pub fn server_from(overrides: &CliOverrides, config_dir: &Path) -> McpServerConfig {
    let settings = load_settings_file(&config_dir.join("config.toml"));
    resolve_server(
        settings.server,
        overrides.server_command.clone(),
        overrides.server_args.clone(),
    )
}

/// CLI command > [server] table > default.
fn resolve_server(
    file: Option<McpServerConfig>,
    command: Option<String>,
    args: Vec<String>,
) -> McpServerConfig {
    let mut server = file.unwrap_or_default();
    if let Some(command) = command {
        server.command = command;
        server.args = args;
    } else if !args.is_empty() {
        server.args = args;
    }
    server
}

/// Get the Relay config directory path (~/.relay/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relay")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            SettingsFile::default()
        }
    }
}
