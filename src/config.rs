//! Configuration for the evaluation pipelines.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Hosted chat-completion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name used for answer generation (must accept image input)
    pub model: String,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling seed forwarded to the API, if any
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_tokens() -> u32 {
    120
}

fn default_temperature() -> f32 {
    0.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            seed: None,
        }
    }
}

/// Where judge prompts are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeBackendKind {
    /// Hosted chat-completion API (shares `llm.api_base` and `llm.api_key`).
    Api,
    /// Locally served model behind a plain text-completion endpoint.
    Local,
}

impl std::str::FromStr for JudgeBackendKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(JudgeBackendKind::Api),
            "local" => Ok(JudgeBackendKind::Local),
            other => Err(EvalError::Config(format!(
                "Unknown judge backend '{}', expected 'api' or 'local'",
                other
            ))),
        }
    }
}

/// LLM-Match judge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    pub backend: JudgeBackendKind,
    pub model: String,
    pub seed: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Base URL of the local completion server (used when `backend: local`)
    pub local_api_base: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            backend: JudgeBackendKind::Api,
            model: "gpt-4-1106-preview".to_string(),
            seed: 1234,
            max_tokens: 32,
            temperature: 0.2,
            local_api_base: "http://localhost:8080".to_string(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat API settings (answer generation)
    pub llm: LlmConfig,
    /// Judge settings (scoring)
    pub judge: JudgeConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    judge: Option<JudgeFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JudgeFileSection {
    backend: Option<JudgeBackendKind>,
    model: Option<String>,
    seed: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    local_api_base: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_API_KEY, LLM_MODEL, JUDGE_*)
    /// 2. Config file (`explicit` if given, else ~/.config/eqa-eval/config.yaml)
    /// 3. Default values
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        match explicit {
            Some(path) => config = Self::load_from_file(path)?,
            None => {
                if let Some(config_path) = Self::config_file_path() {
                    if config_path.exists() {
                        config = Self::load_from_file(&config_path)?;
                    }
                }
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            self.llm.api_key = api_key;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = temp;
            }
        }

        if let Ok(backend) = env::var("JUDGE_BACKEND") {
            self.judge.backend = backend.parse()?;
        }

        if let Ok(model) = env::var("JUDGE_MODEL") {
            self.judge.model = model;
        }

        if let Ok(base) = env::var("LOCAL_LLM_BASE") {
            self.judge.local_api_base = base;
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
            config.llm.seed = llm.seed.or(config.llm.seed);
        }

        if let Some(judge) = file_config.judge {
            if let Some(backend) = judge.backend {
                config.judge.backend = backend;
            }
            if let Some(model) = judge.model {
                config.judge.model = model;
            }
            if let Some(seed) = judge.seed {
                config.judge.seed = seed;
            }
            if let Some(max_tokens) = judge.max_tokens {
                config.judge.max_tokens = max_tokens;
            }
            if let Some(temperature) = judge.temperature {
                config.judge.temperature = temperature;
            }
            if let Some(base) = judge.local_api_base {
                config.judge.local_api_base = base;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "eqa-eval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate the settings needed to reach the hosted chat API.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(EvalError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(EvalError::Config(
                "LLM API key is required. Set LLM_API_KEY (or OPENAI_API_KEY) or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(EvalError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the settings the judge backend needs.
    pub fn validate_judge(&self) -> Result<()> {
        if self.judge.model.is_empty() {
            return Err(EvalError::Config("Judge model is required.".to_string()));
        }

        match self.judge.backend {
            JudgeBackendKind::Api => {
                if self.llm.api_key.is_empty() || self.llm.api_base.is_empty() {
                    return Err(EvalError::Config(
                        "The hosted judge needs LLM_API_BASE and LLM_API_KEY.".to_string(),
                    ));
                }
            }
            JudgeBackendKind::Local => {
                if self.judge.local_api_base.is_empty() {
                    return Err(EvalError::Config(
                        "The local judge needs LOCAL_LLM_BASE or judge.local_api_base."
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Chat API settings for the hosted judge: the `llm` endpoint and key
    /// with the judge's model, seed and sampling.
    pub fn judge_llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_base: self.llm.api_base.clone(),
            api_key: self.llm.api_key.clone(),
            model: self.judge.model.clone(),
            max_tokens: self.judge.max_tokens,
            temperature: self.judge.temperature,
            seed: Some(self.judge.seed),
        }
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            judge: JudgeConfig::default(),
        }
    }
}
