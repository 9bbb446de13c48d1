//! Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Concrete backend selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Google,
    Microsoft,
    Bing,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Google => write!(f, "google"),
            BackendKind::Microsoft => write!(f, "microsoft"),
            BackendKind::Bing => write!(f, "bing"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(BackendKind::Google),
            "microsoft" => Ok(BackendKind::Microsoft),
            "bing" => Ok(BackendKind::Bing),
            other => Err(anyhow::anyhow!("Unknown backend: {}", other)),
        }
    }
}

impl BackendKind {
    /// Parse a comma separated backend list, keeping order
    pub fn parse_list(list: &str) -> anyhow::Result<Vec<Self>> {
        list.split(',')
            .filter(|item| !item.trim().is_empty())
            .map(|item| item.parse::<BackendKind>())
            .collect()
    }
}

/// Default fallback order
const DEFAULT_BACKENDS: &[BackendKind] = &[
    BackendKind::Google,
    BackendKind::Microsoft,
    BackendKind::Bing,
];

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Configuration for the translator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Backends in fallback order
    pub backends: Vec<BackendKind>,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            backends: DEFAULT_BACKENDS.to_vec(),
            timeout_ms: 30000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pool_idle_timeout_secs: 30,
            pool_max_idle_per_host: 10,
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let backends = match std::env::var("TRANSLATOR_BACKENDS") {
            Ok(list) => BackendKind::parse_list(&list)?,
            Err(_) => defaults.backends,
        };

        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse::<u64>()?;

        let user_agent = std::env::var("TRANSLATOR_USER_AGENT")
            .unwrap_or(defaults.user_agent);

        Ok(Self {
            backends,
            timeout_ms,
            user_agent,
            ..defaults
        })
    }

    /// Load and validate configuration from the environment
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::from_env()?;
        config.validate()?;

        info!(
            "Loaded configuration with backends: {}",
            config
                .backends
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backends.is_empty() {
            return Err(anyhow::anyhow!("At least one backend is required"));
        }

        for (i, kind) in self.backends.iter().enumerate() {
            if self.backends[..i].contains(kind) {
                return Err(anyhow::anyhow!("Backend {} is listed more than once", kind));
            }
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!("timeout_ms must be greater than 0"));
        }

        Ok(())
    }
}
