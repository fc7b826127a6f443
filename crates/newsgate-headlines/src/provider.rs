use std::time::Duration;

use async_trait::async_trait;
use newsgate_core::{ArticleList, FetchSummary, NewsgateError, ProviderConfig, ProviderKind};
use tracing::{debug, warn};

use crate::newsapi::NewsApiProvider;
use crate::thenewsapi::TheNewsApiProvider;

/// Articles from one fetch with their paging record.
#[derive(Debug, Clone, PartialEq)]
pub struct Headlines {
    /// Normalized articles in provider order.
    pub articles: ArticleList,
    /// The provider's own counts when it sends them, otherwise derived
    /// from the list length.
    pub summary: FetchSummary,
}

/// A source of top headlines, normalized to [`ArticleList`].
///
/// Adapters are the only place that knows a provider's response shape;
/// everything downstream works on the canonical list.
#[async_trait]
pub trait HeadlineProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Fetch the current top headlines.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Config`] if the API key is missing, or
    /// [`NewsgateError::Upstream`] if the request fails, the provider
    /// answers with a non-success status, or the body has an unknown shape.
    async fn fetch_top_headlines(&self) -> Result<ArticleList, NewsgateError>;

    /// Fetch the current top headlines together with a paging summary.
    ///
    /// Providers that report their own counts override this.
    ///
    /// # Errors
    ///
    /// Same as [`HeadlineProvider::fetch_top_headlines`].
    async fn fetch_headlines(&self) -> Result<Headlines, NewsgateError> {
        let articles = self.fetch_top_headlines().await?;
        let summary = FetchSummary::from_articles(&articles);
        Ok(Headlines { articles, summary })
    }
}

/// Build the adapter selected by `config.kind`.
///
/// # Errors
///
/// Returns [`NewsgateError::Upstream`] if the HTTP client cannot be built.
///
/// # Examples
///
/// ```
/// use newsgate_core::{ProviderConfig, ProviderKind};
/// use newsgate_headlines::build_provider;
///
/// let config = ProviderConfig {
///     kind: ProviderKind::NewsApi,
///     ..ProviderConfig::default()
/// };
/// let provider = build_provider(&config).unwrap();
/// assert_eq!(provider.name(), "newsapi");
/// ```
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn HeadlineProvider>, NewsgateError> {
    let client = http_client()?;
    Ok(match config.kind {
        ProviderKind::TheNewsApi => Box::new(TheNewsApiProvider::with_client(client, config)),
        ProviderKind::NewsApi => Box::new(NewsApiProvider::with_client(client, config)),
    })
}

pub(crate) fn http_client() -> Result<reqwest::Client, NewsgateError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| NewsgateError::upstream(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn require_key(api_key: &Option<String>) -> Result<&str, NewsgateError> {
    api_key
        .as_deref()
        .ok_or_else(|| NewsgateError::Config("Missing NEWS_API_KEY".into()))
}

/// Issue one GET and decode the JSON body. No retries.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value, NewsgateError> {
    debug!(%url, "fetching headlines");
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| NewsgateError::upstream(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        warn!(%status, "headline provider returned an error");
        return Err(NewsgateError::upstream(format!(
            "provider returned {status}: {body_text}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| NewsgateError::upstream(format!("failed to parse response: {e}")))
}
