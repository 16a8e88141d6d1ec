//! Translator configuration.
//!
//! Loaded from TOML, then overridden by environment variables:
//!
//! ```toml
//! backend = "rules"
//!
//! [llm]
//! model = "gpt-4"
//! temperature = 0.2
//! max_tokens = 1024
//!
//! [rules]
//! substitute_operators = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::Backend;
use crate::error::{TranslateError, TranslateResult};
use crate::parser::ClassifierOptions;

/// Environment variable holding the LLM credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the model id.
pub const MODEL_ENV: &str = "WF2SQL_MODEL";
/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "wf2sql.toml";

/// Complete configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend used when none is requested explicitly.
    pub backend: Backend,
    pub llm: LlmConfig,
    pub rules: ClassifierOptions,
}

/// Chat-completion settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Credential; usually supplied through `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Replaces the built-in translation instruction.
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 60,
            system_prompt: None,
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> TranslateResult<Self> {
        toml::from_str(content).map_err(|e| TranslateError::config(format!("invalid config: {}", e)))
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> TranslateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslateError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load from `explicit`, else `./wf2sql.toml`, else the user config dir,
    /// else defaults; then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> TranslateResult<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_paths().into_iter().find(|p| p.exists()),
        };

        let mut config = match path {
            Some(p) => {
                debug!("loading config from {}", p.display());
                Self::from_file(&p)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
    }
}

/// Candidate config files, in lookup order.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wf2sql").join("config.toml"));
    }
    paths
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the default backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm.api_key = Some(key.into());
        self
    }

    /// Set the model id
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.model = model.into();
        self
    }

    /// Set the API base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.llm.base_url = url.into();
        self
    }

    /// Replace the translation instruction
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.llm.system_prompt = Some(prompt.into());
        self
    }

    /// Toggle operator substitution in conditions
    pub fn substitute_operators(mut self, on: bool) -> Self {
        self.config.rules.substitute_operators = on;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.temperature, 0.2);
        assert!(config.llm.api_key.is_none());
        assert!(config.rules.substitute_operators);
        assert_eq!(config.backend, Backend::Rules);
    }

    #[test]
    fn test_backend_from_toml() {
        let config = Config::from_toml("backend = \"llm\"\n\n[llm]\nmodel = \"gpt-4o\"\n").unwrap();
        assert_eq!(config.backend, Backend::Llm);
        assert_eq!(config.llm.model, "gpt-4o");

        let err = Config::from_toml("backend = \"oracle\"").unwrap_err();
        assert!(matches!(err, TranslateError::Config(_)));
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [llm]
            model = "gpt-4o-mini"
            max_tokens = 256

            [rules]
            substitute_operators = false
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert!(!config.rules.substitute_operators);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[llm\nmodel = 1").unwrap_err();
        assert!(matches!(err, TranslateError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            API_KEY_ENV => Some("sk-test".to_string()),
            MODEL_ENV => Some("gpt-3.5-turbo".to_string()),
            _ => None,
        });
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_blank_env_ignored() {
        let mut config = Config::builder().api_key("from-file").build();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.llm.model, "gpt-4");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/wf2sql.toml"))).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
