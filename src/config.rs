//! Run configuration, built once at start-up and passed down explicitly.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "https://api.rainforestapi.com/request";
pub const DEFAULT_MARKETPLACE: &str = "amazon.pl";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// Substrings matched against lower-cased specification names to pick out
/// the Size and Design attributes of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTokens {
    pub size: Vec<String>,
    pub design: Vec<String>,
}

impl Default for AttributeTokens {
    fn default() -> Self {
        Self {
            size: vec!["rozmiar".into(), "size".into()],
            design: vec!["kolor".into(), "color".into(), "desen".into()],
        }
    }
}

impl AttributeTokens {
    /// Builds a token set, falling back to the defaults for any empty list.
    pub fn new(size: Vec<String>, design: Vec<String>) -> Self {
        let defaults = Self::default();
        let clean = |tokens: Vec<String>, fallback: Vec<String>| {
            let tokens: Vec<String> = tokens
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() { fallback } else { tokens }
        };
        Self {
            size: clean(size, defaults.size),
            design: clean(design, defaults.design),
        }
    }

    pub fn is_size(&self, lowered_name: &str) -> bool {
        self.size.iter().any(|t| lowered_name.contains(t.as_str()))
    }

    pub fn is_design(&self, lowered_name: &str) -> bool {
        self.design.iter().any(|t| lowered_name.contains(t.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub password: Option<String>,
    pub endpoint: String,
    pub marketplace: String,
    pub timeout: Duration,
    pub pacing: Duration,
    pub tokens: AttributeTokens,
}

impl AppConfig {
    /// Creates a config with default endpoint, marketplace, timing and tokens.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            password: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            pacing: DEFAULT_PACING,
            tokens: AttributeTokens::default(),
        }
    }

    /// Reads `RAINFOREST_API_KEY` and `APP_PASSWORD` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var("RAINFOREST_API_KEY").ok(),
            std::env::var("APP_PASSWORD").ok(),
        )
    }

    pub fn from_values(
        api_key: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        config.password = password.filter(|p| !p.is_empty());
        Ok(config)
    }

    /// Checks the supplied password against the configured one, if any.
    pub fn authorize(&self, supplied: Option<&str>) -> Result<(), ConfigError> {
        match &self.password {
            None => Ok(()),
            Some(expected) if supplied == Some(expected.as_str()) => Ok(()),
            Some(_) => Err(ConfigError::PasswordRejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_error() {
        assert!(matches!(
            AppConfig::from_values(None, None),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            AppConfig::from_values(Some("   ".into()), None),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_values(Some("key".into()), None).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.marketplace, "amazon.pl");
        assert_eq!(config.pacing, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_authorize() {
        let open = AppConfig::new("key");
        assert!(open.authorize(None).is_ok());

        let config = AppConfig::from_values(Some("key".into()), Some("s3cret".into())).unwrap();
        assert!(config.authorize(Some("s3cret")).is_ok());
        assert!(config.authorize(Some("wrong")).is_err());
        assert!(config.authorize(None).is_err());
    }

    #[test]
    fn test_token_matching() {
        let tokens = AttributeTokens::default();
        assert!(tokens.is_size("rozmiar produktu"));
        assert!(tokens.is_design("kolor"));
        assert!(!tokens.is_design("material"));
    }

    #[test]
    fn test_tokens_new_normalizes_and_falls_back() {
        let tokens = AttributeTokens::new(vec![" Width ".into()], vec![]);
        assert_eq!(tokens.size, vec!["width".to_string()]);
        assert_eq!(tokens.design, AttributeTokens::default().design);
    }
}
