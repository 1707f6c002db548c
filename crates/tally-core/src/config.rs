//! Configuration
//!
//! Loaded from TOML with three-layer resolution:
//! 1. Explicit path (`--config`)
//! 2. User config (~/.config/tally/config.toml)
//! 3. Embedded default (config/tally.toml)
//!
//! Environment variables are applied on top, see [`Config::apply_env`].

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TOP_TRANSACTIONS: usize = 3;

/// Which model backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// No remote calls; keyword rules only
    None,
    Gemini,
    Ollama,
    OpenAICompatible,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::OpenAICompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }

    /// Host used when the config names a backend but no host
    pub fn default_host(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("https://generativelanguage.googleapis.com"),
            Self::Ollama => Some("http://localhost:11434"),
            Self::OpenAICompatible => Some("http://localhost:8080"),
            Self::None | Self::Mock => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::Ollama => "llama3.2",
            Self::OpenAICompatible => "gpt-3.5-turbo",
            Self::None => "",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "" => Ok(Self::None),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "mock" => Ok(Self::Mock),
            other => Err(Error::Config(format!("Unknown AI backend: {}", other))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model backend settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: BackendKind,
    pub host: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::None,
            host: None,
            model: String::new(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AiConfig {
    /// Host to use, falling back to the backend's default
    pub fn effective_host(&self) -> Option<String> {
        self.host
            .clone()
            .or_else(|| self.backend.default_host().map(str::to_string))
    }

    /// Model to use, falling back to the backend's default
    pub fn effective_model(&self) -> String {
        if self.model.is_empty() {
            self.backend.default_model().to_string()
        } else {
            self.model.clone()
        }
    }
}

/// Report rendering settings
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub top_transactions: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_transactions: DEFAULT_TOP_TRANSACTIONS,
        }
    }
}

/// Full configuration, passed explicitly to whatever needs it
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub ai: AiConfig,
    pub report: ReportConfig,
    /// File the configuration was read from (None = embedded default)
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration (explicit path, then user config, then default)
    /// and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(user_path) => Self::from_file(&user_path)?,
                None => Self::embedded()?,
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// The embedded default, without environment overrides
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = parse_config(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `TALLY_AI_*` and `GEMINI_API_KEY` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    ///
    /// An unknown backend name is logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = get("TALLY_AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.ai.backend = kind,
                Err(e) => tracing::warn!(backend = %backend, "Ignoring TALLY_AI_BACKEND: {}", e),
            }
        }
        if let Some(host) = get("TALLY_AI_HOST") {
            self.ai.host = Some(host);
        }
        if let Some(model) = get("TALLY_AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(key) = get("TALLY_AI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if self.ai.backend == BackendKind::Gemini && self.ai.api_key.is_none() {
            self.ai.api_key = get("GEMINI_API_KEY");
        }
    }
}

/// User configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ai: Option<RawAi>,
    report: Option<RawReport>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReport {
    top_transactions: Option<usize>,
}

fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(ai) = raw.ai {
        if let Some(backend) = ai.backend {
            config.ai.backend = backend.parse()?;
        }
        config.ai.host = ai.host.filter(|h| !h.trim().is_empty());
        if let Some(model) = ai.model {
            config.ai.model = model;
        }
        config.ai.api_key = ai.api_key.filter(|k| !k.trim().is_empty());
        if let Some(timeout) = ai.timeout_secs {
            if timeout == 0 {
                return Err(Error::Config("ai.timeout_secs must be positive".into()));
            }
            config.ai.timeout_secs = timeout;
        }
    }

    if let Some(report) = raw.report {
        if let Some(top) = report.top_transactions {
            config.report.top_transactions = top;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_parses() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.ai.backend, BackendKind::Gemini);
        assert_eq!(config.ai.model, "gemini-1.5-flash");
        assert_eq!(config.ai.timeout_secs, 60);
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.report.top_transactions, 3);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config("[ai]\nbackend = \"ollama\"\n").unwrap();
        assert_eq!(config.ai.backend, BackendKind::Ollama);
        assert_eq!(config.ai.timeout_secs, 60);
        assert_eq!(config.ai.effective_host().unwrap(), "http://localhost:11434");
        assert_eq!(config.ai.effective_model(), "llama3.2");
        assert_eq!(config.report.top_transactions, 3);
    }

    #[test]
    fn test_empty_config_is_rules_only() {
        let config = parse_config("").unwrap();
        assert_eq!(config.ai.backend, BackendKind::None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(parse_config("[ai]\nbackend = \"skynet\"\n").is_err());
        assert!(parse_config("[ai]\ntimeout_secs = 0\n").is_err());
        assert!(parse_config("[ai]\nflavour = \"x\"\n").is_err());
        assert!(parse_config("not toml [").is_err());
    }

    #[test]
    fn test_from_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "[report]\ntop_transactions = 5\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.report.top_transactions, 5);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/tally.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::embedded().unwrap();
        let env: HashMap<&str, &str> = [
            ("TALLY_AI_BACKEND", "openai_compatible"),
            ("TALLY_AI_HOST", "http://10.0.0.5:8000"),
            ("TALLY_AI_MODEL", "qwen2.5"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.ai.backend, BackendKind::OpenAICompatible);
        assert_eq!(config.ai.host.as_deref(), Some("http://10.0.0.5:8000"));
        assert_eq!(config.ai.model, "qwen2.5");
    }

    #[test]
    fn test_gemini_key_fallback() {
        let mut config = Config::embedded().unwrap();
        config.apply_overrides(|k| (k == "GEMINI_API_KEY").then(|| "g-key".to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("g-key"));

        let mut config = Config::embedded().unwrap();
        config.apply_overrides(|k| match k {
            "TALLY_AI_API_KEY" => Some("t-key".to_string()),
            "GEMINI_API_KEY" => Some("g-key".to_string()),
            _ => None,
        });
        assert_eq!(config.ai.api_key.as_deref(), Some("t-key"));
    }

    #[test]
    fn test_unknown_backend_override_ignored() {
        let mut config = Config::embedded().unwrap();
        config.apply_overrides(|k| (k == "TALLY_AI_BACKEND").then(|| "skynet".to_string()));
        assert_eq!(config.ai.backend, BackendKind::Gemini);
    }
}
