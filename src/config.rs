use std::path::PathBuf;
use std::time::Duration;

use crate::ai::ProviderKind;
use crate::error::{Result, SpyError};

pub const DEFAULT_MODEL: &str = "mistral-large";
pub const DEFAULT_OUTPUT_DIR: &str = "./reports";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

#[derive(Debug, Clone)]
pub struct Config {
    pub mistral_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub model: String,
    pub output_dir: PathBuf,
    pub browser_timeout: Duration,
    pub api_timeout: Duration,
    pub max_red_flags: usize,
    pub webdriver_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mistral_api_key: None,
            anthropic_api_key: None,
            openai_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            browser_timeout: Duration::from_secs(30),
            api_timeout: Duration::from_secs(60),
            max_red_flags: 10,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }
}

impl Config {
    // Reads the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            mistral_api_key: get("MISTRAL_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            model: get("CAREER_SPY_MODEL").unwrap_or(defaults.model),
            output_dir: get("CAREER_SPY_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            browser_timeout: match get("CAREER_SPY_BROWSER_TIMEOUT_SECS") {
                Some(raw) => {
                    Duration::from_secs(parse_number("CAREER_SPY_BROWSER_TIMEOUT_SECS", &raw)?)
                }
                None => defaults.browser_timeout,
            },
            api_timeout: match get("CAREER_SPY_API_TIMEOUT_SECS") {
                Some(raw) => {
                    Duration::from_secs(parse_number("CAREER_SPY_API_TIMEOUT_SECS", &raw)?)
                }
                None => defaults.api_timeout,
            },
            max_red_flags: match get("CAREER_SPY_MAX_RED_FLAGS") {
                Some(raw) => parse_number("CAREER_SPY_MAX_RED_FLAGS", &raw)? as usize,
                None => defaults.max_red_flags,
            },
            webdriver_url: get("CAREER_SPY_WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
        })
    }

    pub fn api_key_for(&self, provider: &ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Mistral => self.mistral_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenAI => self.openai_api_key.as_deref(),
        }
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| SpyError::config(format!("{} must be a whole number, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.output_dir, PathBuf::from("./reports"));
        assert_eq!(config.browser_timeout, Duration::from_secs(30));
        assert_eq!(config.api_timeout, Duration::from_secs(60));
        assert_eq!(config.max_red_flags, 10);
        assert!(config.mistral_api_key.is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MISTRAL_API_KEY", "abc"),
            ("CAREER_SPY_MODEL", "api-sonnet"),
            ("CAREER_SPY_OUTPUT_DIR", "/tmp/spy"),
            ("CAREER_SPY_API_TIMEOUT_SECS", "5"),
            ("CAREER_SPY_MAX_RED_FLAGS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.api_key_for(&ProviderKind::Mistral), Some("abc"));
        assert_eq!(config.model, "api-sonnet");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/spy"));
        assert_eq!(config.api_timeout, Duration::from_secs(5));
        assert_eq!(config.max_red_flags, 3);
    }

    #[test]
    fn test_blank_api_key_counts_as_absent() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert_eq!(config.api_key_for(&ProviderKind::OpenAI), None);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let result =
            Config::from_lookup(lookup_from(&[("CAREER_SPY_BROWSER_TIMEOUT_SECS", "soon")]));
        let err = result.unwrap_err();
        assert!(matches!(err, SpyError::Config { .. }));
        assert!(err.to_string().contains("CAREER_SPY_BROWSER_TIMEOUT_SECS"));
    }
}
