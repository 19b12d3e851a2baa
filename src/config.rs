// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::semaphore::SemaphoreThresholds;

pub const CONFIG_PATH_ENV: &str = "STOCK_SEMAPHORE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plain-text list of symbols, one per line
    pub tickers_file: PathBuf,
    /// Root of the generated site
    pub output_dir: PathBuf,
    pub analysis: AnalysisConfig,
    pub news: NewsConfig,
    pub http: HttpConfig,
    pub summarizer: SummarizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tickers_file: PathBuf::from("tickers.txt"),
            output_dir: PathBuf::from("public"),
            analysis: AnalysisConfig::default(),
            news: NewsConfig::default(),
            http: HttpConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Calendar days on each side of a reference date that are averaged
    pub window_days: u32,
    /// 1-year change (%) from which a company is green
    pub green_min_change: f64,
    /// 1-year change (%) from which a company is yellow
    pub yellow_min_change: f64,
    /// Tickers processed at the same time
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let thresholds = SemaphoreThresholds::default();
        Self {
            window_days: 7,
            green_min_change: thresholds.green_min,
            yellow_min_change: thresholds.yellow_min,
            concurrency: 1,
        }
    }
}

impl AnalysisConfig {
    pub fn thresholds(&self) -> SemaphoreThresholds {
        SemaphoreThresholds {
            green_min: self.green_min_change,
            yellow_min: self.yellow_min_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub max_articles: usize,
    /// Raw results requested per article kept, to survive filtering
    pub over_fetch_factor: usize,
    pub language: String,
    pub sort_by: String,
    pub min_sentences: u32,
    pub max_sentences: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            max_articles: 5,
            over_fetch_factor: 5,
            language: "en".to_string(),
            sort_by: "relevancy".to_string(),
            min_sentences: 3,
            max_sentences: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Pause before each market-data request
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            request_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.3,
            max_tokens: 400,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.max_articles == 0 {
            return Err(ConfigError::Invalid("news.max_articles must be at least 1".into()));
        }
        if self.news.over_fetch_factor == 0 {
            return Err(ConfigError::Invalid(
                "news.over_fetch_factor must be at least 1".into(),
            ));
        }
        if self.news.min_sentences > self.news.max_sentences {
            return Err(ConfigError::Invalid(
                "news.min_sentences must not exceed news.max_sentences".into(),
            ));
        }
        if self.analysis.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "analysis.concurrency must be at least 1".into(),
            ));
        }
        // TOML accepts `nan` and `inf`, which would make every comparison false
        if !self.analysis.green_min_change.is_finite() || !self.analysis.yellow_min_change.is_finite() {
            return Err(ConfigError::Invalid(
                "analysis.green_min_change and analysis.yellow_min_change must be finite numbers"
                    .into(),
            ));
        }
        if self.analysis.green_min_change < self.analysis.yellow_min_change {
            return Err(ConfigError::Invalid(
                "analysis.green_min_change must not be below analysis.yellow_min_change".into(),
            ));
        }
        Ok(())
    }
}

/// Config path from `STOCK_SEMAPHORE_CONFIG`, or `config.toml`
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load and validate the config; a missing file means defaults
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!("No config file at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&config_str).map_err(|source| ConfigError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;

    Ok(config)
}

/// Symbols in file order, skipping blanks, `#` comments and repeats
pub fn parse_tickers(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tickers = Vec::new();

    for line in content.lines() {
        let ticker = line.trim();
        if ticker.is_empty() || ticker.starts_with('#') {
            continue;
        }
        if !seen.insert(ticker.to_string()) {
            warn!("Ignoring duplicate ticker {}", ticker);
            continue;
        }
        tickers.push(ticker.to_string());
    }

    tickers
}

pub fn load_tickers(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::TickerList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_tickers(&content))
}

/// API keys taken from the environment
#[derive(Clone, PartialEq)]
pub struct Secrets {
    pub fmp_api_key: String,
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("fmp_api_key", &"***")
            .field("news_api_key", &self.news_api_key.as_ref().map(|_| "***"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("openai_base_url", &self.openai_base_url)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let fmp_api_key = get("FMP_API_KEY")
            .or_else(|| get("FINANCIALMODELINGPREP_API_KEY"))
            .ok_or(ConfigError::MissingSecret("FMP_API_KEY"))?;

        Ok(Self {
            fmp_api_key,
            news_api_key: get("NEWS_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
        })
    }
}
