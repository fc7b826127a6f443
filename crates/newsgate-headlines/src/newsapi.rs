//! Adapter for newsapi.org top headlines.

use async_trait::async_trait;
use newsgate_core::{Article, ArticleList, NewsgateError, ProviderConfig};
use serde_json::{Map, Value};
use tracing::info;

use crate::normalize::{collect_articles, source_field, text_field};
use crate::provider::{get_json, http_client, require_key, HeadlineProvider};

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const TOP_HEADLINES_PATH: &str = "/v2/top-headlines";

/// Client for newsapi.org.
///
/// Articles carry no id and an object-valued `source` (`{"id", "name"}`).
pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    country: Option<String>,
}

impl std::fmt::Debug for NewsApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiProvider")
            .field("base_url", &self.base_url)
            .field("country", &self.country)
            .finish_non_exhaustive()
    }
}

impl NewsApiProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Upstream`] if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, NewsgateError> {
        Ok(Self::with_client(http_client()?, config))
    }

    pub(crate) fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            country: config.country.clone(),
        }
    }

    /// Full URL of the top-headlines endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{TOP_HEADLINES_PATH}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl HeadlineProvider for NewsApiProvider {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch_top_headlines(&self) -> Result<ArticleList, NewsgateError> {
        let api_key = require_key(&self.api_key)?;

        let mut query = vec![("apiKey", api_key)];
        if let Some(country) = &self.country {
            query.push(("country", country.as_str()));
        }

        let body = get_json(&self.client, &self.endpoint(), &query).await?;
        let articles = normalize(&body)?;
        info!(provider = self.name(), count = articles.len(), "fetched headlines");
        Ok(articles)
    }
}

/// Normalize a newsapi.org response body.
///
/// # Errors
///
/// Returns [`NewsgateError::Upstream`] if `articles` is missing or has an
/// unknown shape.
pub fn normalize(body: &Value) -> Result<ArticleList, NewsgateError> {
    collect_articles(body, "articles", map_article)
}

fn map_article(obj: &Map<String, Value>) -> Article {
    Article {
        title: text_field(obj, "title"),
        description: text_field(obj, "description"),
        url: text_field(obj, "url"),
        image_url: text_field(obj, "urlToImage"),
        published_at: text_field(obj, "publishedAt"),
        source: source_field(obj),
        snippet: text_field(obj, "content"),
        ..Article::default()
    }
}
