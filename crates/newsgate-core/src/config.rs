use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NewsgateError;

/// Top-level configuration loaded from `newsgate.toml`.
///
/// Resolved once at process start: file values first, then environment
/// overrides via [`NewsgateConfig::apply_env`]. Components receive it by
/// reference and only check for missing values at the point of use.
///
/// # Examples
///
/// ```
/// use newsgate_core::NewsgateConfig;
///
/// let config = NewsgateConfig::default();
/// assert_eq!(config.llm.model, "gpt-4o-mini");
/// assert!(config.llm.api_key.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsgateConfig {
    /// Headline provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// LLM provider settings for the relevance filter.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Pay-per-call gate settings.
    #[serde(default)]
    pub payment: PaymentConfig,
}

impl NewsgateConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Io`] if the file cannot be read, or
    /// [`NewsgateError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use newsgate_core::NewsgateConfig;
    /// use std::path::Path;
    ///
    /// let config = NewsgateConfig::from_file(Path::new("newsgate.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, NewsgateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_core::{NewsgateConfig, ProviderKind};
    ///
    /// let toml = r#"
    /// [provider]
    /// kind = "newsapi"
    /// country = "gb"
    /// "#;
    /// let config = NewsgateConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.provider.kind, ProviderKind::NewsApi);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, NewsgateError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values from the environment.
    ///
    /// `lookup` maps a variable name to its value; empty values count as
    /// unset. Pass `|k| std::env::var(k).ok()` in production and a closure
    /// over a map in tests.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Config`] if `NEWS_PROVIDER` names an
    /// unknown provider.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_core::NewsgateConfig;
    ///
    /// let config = NewsgateConfig::default()
    ///     .apply_env(|k| (k == "OPENAI_API_KEY").then(|| "sk-test".to_string()))
    ///     .unwrap();
    /// assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    /// ```
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, NewsgateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(kind) = get("NEWS_PROVIDER") {
            self.provider.kind = kind.parse()?;
        }
        if let Some(key) = get("NEWS_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("FACILITATOR_URL") {
            self.payment.facilitator_url = Some(url);
        }
        for (name, network) in self.payment.networks.iter_mut() {
            if let Some(address) = get(&address_env_var(name)) {
                network.pay_to = Some(address);
            }
        }

        Ok(self)
    }

    /// Overlay values from the process environment.
    ///
    /// # Errors
    ///
    /// See [`NewsgateConfig::apply_env`].
    pub fn with_process_env(self) -> Result<Self, NewsgateError> {
        self.apply_env(|key| std::env::var(key).ok())
    }
}

/// Environment variable holding the recipient address for `network`.
///
/// # Examples
///
/// ```
/// use newsgate_core::address_env_var;
///
/// assert_eq!(address_env_var("base-sepolia"), "ADDRESS_BASE_SEPOLIA");
/// ```
pub fn address_env_var(network: &str) -> String {
    format!("ADDRESS_{}", network.to_uppercase().replace('-', "_"))
}

/// Which headline provider adapter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// thenewsapi.com: `data` as a flat list or grouped by category.
    #[default]
    TheNewsApi,
    /// newsapi.org: flat `articles` list with object-valued `source`.
    NewsApi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TheNewsApi => write!(f, "thenewsapi"),
            Self::NewsApi => write!(f, "newsapi"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = NewsgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thenewsapi" => Ok(Self::TheNewsApi),
            "newsapi" => Ok(Self::NewsApi),
            other => Err(NewsgateError::Config(format!(
                "unknown news provider '{other}' (expected \"thenewsapi\" or \"newsapi\")"
            ))),
        }
    }
}

/// Headline provider configuration.
///
/// # Examples
///
/// ```
/// use newsgate_core::{ProviderConfig, ProviderKind};
///
/// let config = ProviderConfig::default();
/// assert_eq!(config.kind, ProviderKind::TheNewsApi);
/// assert_eq!(config.locale.as_deref(), Some("us"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Adapter selection.
    #[serde(default)]
    pub kind: ProviderKind,
    /// API key sent as a query credential.
    pub api_key: Option<String>,
    /// Custom base URL, mostly for tests and proxies.
    pub base_url: Option<String>,
    /// Locale filter (TheNewsAPI).
    #[serde(default = "default_locale")]
    pub locale: Option<String>,
    /// Language filter (TheNewsAPI).
    #[serde(default = "default_language")]
    pub language: Option<String>,
    /// Country filter (NewsAPI).
    #[serde(default = "default_country")]
    pub country: Option<String>,
}

fn default_locale() -> Option<String> {
    Some("us".into())
}

fn default_language() -> Option<String> {
    Some("en".into())
}

fn default_country() -> Option<String> {
    Some("us".into())
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            base_url: None,
            locale: default_locale(),
            language: default_language(),
            country: default_country(),
        }
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use newsgate_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Pay-per-call gate configuration.
///
/// # Examples
///
/// ```
/// use newsgate_core::PaymentConfig;
///
/// let config = PaymentConfig::default();
/// assert!(config.enabled);
/// assert_eq!(config.price, "$0.01");
/// assert!(config.networks.contains_key("base-sepolia"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// When `false`, gated tools run without payment.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-call price in USD, e.g. `"$0.01"`.
    #[serde(default = "default_price")]
    pub price: String,
    /// Base URL of the payment facilitator.
    pub facilitator_url: Option<String>,
    /// Accepted networks keyed by network name.
    #[serde(default = "default_networks")]
    pub networks: BTreeMap<String, NetworkConfig>,
}

fn default_enabled() -> bool {
    true
}

fn default_price() -> String {
    "$0.01".into()
}

fn default_networks() -> BTreeMap<String, NetworkConfig> {
    let mut networks = BTreeMap::new();
    networks.insert(
        "base".to_string(),
        NetworkConfig {
            pay_to: None,
            asset: Some("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".into()),
            decimals: default_decimals(),
        },
    );
    networks.insert(
        "base-sepolia".to_string(),
        NetworkConfig {
            pay_to: None,
            asset: Some("0x036CbD53842c5426634e7929541eC2318f3dCF7e".into()),
            decimals: default_decimals(),
        },
    );
    networks
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            price: default_price(),
            facilitator_url: None,
            networks: default_networks(),
        }
    }
}

/// Recipient and asset for one payment network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Recipient address. Networks without one are not offered.
    pub pay_to: Option<String>,
    /// Token contract address used for payment.
    pub asset: Option<String>,
    /// Token decimals (USDC: 6).
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    6
}
