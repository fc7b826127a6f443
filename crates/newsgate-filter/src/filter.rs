use newsgate_core::{ArticleList, FilterResult, LlmConfig, NewsgateError};
use tracing::{info, warn};

use crate::llm::{ChatMessage, LlmClient, Role};
use crate::prompt::{self, FilterResponse};

/// Selects the business-relevant subset of an article list with an LLM.
///
/// Failures are split into tiers: a missing credential is reported as
/// [`FilterResult::Failed`]; a failed model call or a malformed answer
/// yields an empty [`FilterResult::Filtered`].
///
/// # Examples
///
/// ```
/// use newsgate_core::{ArticleList, FilterResult, LlmConfig};
/// use newsgate_filter::RelevanceFilter;
///
/// # async fn example() {
/// let filter = RelevanceFilter::new(&LlmConfig::default()).unwrap();
/// let result = filter.filter(&ArticleList::new()).await;
/// assert_eq!(
///     result,
///     FilterResult::Failed { error: "Missing OPENAI_API_KEY".into() }
/// );
/// # }
/// ```
#[derive(Debug)]
pub struct RelevanceFilter {
    llm: Option<LlmClient>,
}

impl RelevanceFilter {
    /// Create a filter from LLM configuration.
    ///
    /// A missing API key is not an error here; it is reported per call.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, NewsgateError> {
        let llm = match config.api_key {
            Some(_) => Some(LlmClient::new(config)?),
            None => None,
        };
        Ok(Self { llm })
    }

    /// Create a filter around an existing client.
    pub fn with_client(llm: LlmClient) -> Self {
        Self { llm: Some(llm) }
    }

    /// Whether a model credential is configured.
    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Run the relevance filter. Never fails; see the type docs for tiers.
    pub async fn filter(&self, articles: &ArticleList) -> FilterResult {
        let Some(llm) = &self.llm else {
            return FilterResult::Failed {
                error: "Missing OPENAI_API_KEY".into(),
            };
        };

        let articles_in = articles.len();
        let response = match request_selection(llm, articles).await {
            Ok(text) => prompt::parse_filter_response(&text),
            Err(e) => {
                warn!(error = %e, "relevance filter call failed; returning no articles");
                return FilterResult::empty();
            }
        };

        if let FilterResponse::Malformed(reason) = &response {
            warn!(%reason, "malformed relevance filter response; returning no articles");
        }

        let selected = response.into_articles();
        info!(
            model = llm.model(),
            articles_in,
            articles_out = selected.len(),
            "relevance filter complete"
        );
        FilterResult::Filtered { articles: selected }
    }
}

async fn request_selection(llm: &LlmClient, articles: &ArticleList) -> Result<String, NewsgateError> {
    let messages = vec![
        ChatMessage {
            role: Role::System,
            content: prompt::build_system_prompt(),
        },
        ChatMessage {
            role: Role::User,
            content: prompt::build_filter_prompt(articles)?,
        },
    ];
    llm.chat(messages).await
}
