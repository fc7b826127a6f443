//! Adapter for thenewsapi.com.
//!
//! The headlines endpoint answers with `data` grouped by category
//! (`{"data": {"general": [...], "business": [...]}}`); the top-stories
//! endpoint uses a flat `data` array. Both shapes normalize the same way.

use async_trait::async_trait;
use newsgate_core::{Article, ArticleList, FetchSummary, NewsgateError, ProviderConfig};
use serde_json::{Map, Value};
use tracing::info;

use crate::normalize::{collect_articles, list_field, number_field, source_field, text_field};
use crate::provider::{get_json, http_client, require_key, HeadlineProvider, Headlines};

const DEFAULT_BASE_URL: &str = "https://api.thenewsapi.com";
const HEADLINES_PATH: &str = "/v1/news/headlines";

/// Client for thenewsapi.com headlines.
///
/// # Examples
///
/// ```
/// use newsgate_core::ProviderConfig;
/// use newsgate_headlines::thenewsapi::TheNewsApiProvider;
///
/// let provider = TheNewsApiProvider::new(&ProviderConfig::default()).unwrap();
/// assert!(provider.endpoint().ends_with("/v1/news/headlines"));
/// ```
pub struct TheNewsApiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    locale: Option<String>,
    language: Option<String>,
}

impl std::fmt::Debug for TheNewsApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TheNewsApiProvider")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl TheNewsApiProvider {
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
            locale: config.locale.clone(),
            language: config.language.clone(),
        }
    }

    /// Full URL of the headlines endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{HEADLINES_PATH}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl HeadlineProvider for TheNewsApiProvider {
    fn name(&self) -> &str {
        "thenewsapi"
    }

    async fn fetch_top_headlines(&self) -> Result<ArticleList, NewsgateError> {
        Ok(self.fetch_headlines().await?.articles)
    }

    async fn fetch_headlines(&self) -> Result<Headlines, NewsgateError> {
        let api_key = require_key(&self.api_key)?;

        let mut query = vec![("api_token", api_key)];
        if let Some(locale) = &self.locale {
            query.push(("locale", locale.as_str()));
        }
        if let Some(language) = &self.language {
            query.push(("language", language.as_str()));
        }

        let body = get_json(&self.client, &self.endpoint(), &query).await?;
        let headlines = normalize_headlines(&body)?;
        info!(
            provider = self.name(),
            count = headlines.articles.len(),
            summary = %headlines.summary,
            "fetched headlines"
        );
        Ok(headlines)
    }
}

/// Normalize a thenewsapi.com response body.
///
/// # Errors
///
/// Returns [`NewsgateError::Upstream`] if `data` is missing or has an
/// unknown shape.
///
/// # Examples
///
/// ```
/// use newsgate_headlines::thenewsapi::normalize;
///
/// let body = serde_json::json!({"data": [{"uuid": "u1", "title": "Hello", "source": "bbc.co.uk"}]});
/// let list = normalize(&body).unwrap();
/// assert_eq!(list.len(), 1);
/// assert_eq!(list.as_slice()[0].source, Some(Some("bbc.co.uk".to_string())));
/// ```
pub fn normalize(body: &Value) -> Result<ArticleList, NewsgateError> {
    collect_articles(body, "data", map_article)
}

/// Normalize a response body and pick its paging summary.
///
/// The `meta` record is used when the provider sent a complete one;
/// otherwise the summary is derived from the list length.
///
/// # Errors
///
/// Same as [`normalize`].
///
/// # Examples
///
/// ```
/// use newsgate_headlines::thenewsapi::normalize_headlines;
///
/// let body = serde_json::json!({
///     "meta": {"found": 120, "returned": 1, "limit": 1, "page": 1},
///     "data": [{"uuid": "u1"}]
/// });
/// let headlines = normalize_headlines(&body).unwrap();
/// assert_eq!(headlines.summary.found, 120);
/// ```
pub fn normalize_headlines(body: &Value) -> Result<Headlines, NewsgateError> {
    let articles = normalize(body)?;
    let summary = body
        .get("meta")
        .and_then(|meta| serde_json::from_value::<FetchSummary>(meta.clone()).ok())
        .unwrap_or_else(|| FetchSummary::from_articles(&articles));
    Ok(Headlines { articles, summary })
}

fn map_article(obj: &Map<String, Value>) -> Article {
    Article {
        identifier: text_field(obj, "uuid"),
        title: text_field(obj, "title"),
        description: text_field(obj, "description"),
        url: text_field(obj, "url"),
        image_url: text_field(obj, "image_url"),
        published_at: text_field(obj, "published_at"),
        source: source_field(obj),
        keywords: text_field(obj, "keywords"),
        snippet: text_field(obj, "snippet"),
        language: text_field(obj, "language"),
        categories: list_field(obj, "categories"),
        relevance_score: number_field(obj, "relevance_score"),
        locale: text_field(obj, "locale"),
        ..Article::default()
    }
}
