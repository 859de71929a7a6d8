use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::bot_config::{BotConfig, Features};
use crate::client::{KikClient, KikClientBuilder, DEFAULT_BASE_URL};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub kik: KikConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// When present, pushed to the platform with `set_config` on startup
    #[serde(default)]
    pub bot: Option<BotSection>,
}

#[derive(Deserialize, Clone)]
pub struct KikConfig {
    pub username: String,
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub verbose: bool,
}

impl std::fmt::Debug for KikConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KikConfig")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            webhook_path: default_webhook_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BotSection {
    pub webhook: Option<String>,
    #[serde(default)]
    pub receive_read_receipts: bool,
    #[serde(default)]
    pub receive_is_typing: bool,
    #[serde(default)]
    pub manually_send_read_receipts: bool,
    #[serde(default)]
    pub receive_delivery_receipts: bool,
}

impl BotSection {
    pub fn to_bot_config(&self) -> BotConfig {
        BotConfig {
            webhook: self.webhook.clone(),
            features: Features {
                receive_read_receipts: self.receive_read_receipts,
                receive_is_typing: self.receive_is_typing,
                manually_send_read_receipts: self.manually_send_read_receipts,
                receive_delivery_receipts: self.receive_delivery_receipts,
            },
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/incoming".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;

        if config.kik.username.trim().is_empty() {
            anyhow::bail!("kik.username must not be empty");
        }
        if config.kik.api_key.trim().is_empty() {
            anyhow::bail!("kik.api_key must not be empty");
        }
        if !config.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "server.webhook_path must start with '/': {}",
                config.server.webhook_path
            );
        }

        Ok(config)
    }

    /// Client builder preloaded with the `[kik]` credentials and options.
    pub fn client_builder(&self) -> KikClientBuilder {
        KikClient::builder(&self.kik.username, &self.kik.api_key)
            .base_url(&self.kik.base_url)
            .verbose(self.kik.verbose)
    }
}
