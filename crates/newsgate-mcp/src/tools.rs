//! Tool implementations for the newsgate MCP server.
//!
//! Two tools are exposed: `news` (free, unfiltered headlines) and
//! `business_news` (paid, relevance-filtered). Both answer with a single
//! text item holding JSON: the payload on success, `{"error": ...}` on
//! failure.

use std::sync::Arc;

use newsgate_core::{FilterResult, NewsgateConfig, NewsgateError};
use newsgate_filter::RelevanceFilter;
use newsgate_headlines::HeadlineProvider;
use rmcp::{
    handler::server::tool::ToolRouter, model::*, service::RequestContext, tool, tool_router,
    ErrorData as McpError, RoleServer,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::payment::{FacilitatorGate, OpenGate, PaymentGate, PAYMENT_META_KEY};

/// MCP server exposing the headline tools.
///
/// Holds only shared, immutable collaborators; each tool call runs its own
/// fetch and filter sequence.
#[derive(Clone)]
pub struct NewsgateServer {
    pub(crate) provider: Arc<dyn HeadlineProvider>,
    pub(crate) filter: Arc<RelevanceFilter>,
    pub(crate) gate: Arc<dyn PaymentGate>,
    pub(crate) tool_router: ToolRouter<Self>,
}

fn mcp_err(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| mcp_err(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn error_result(envelope: &Value) -> CallToolResult {
    CallToolResult::error(vec![Content::text(envelope.to_string())])
}

fn error_message(message: &str) -> CallToolResult {
    error_result(&serde_json::json!({ "error": message }))
}

#[tool_router]
impl NewsgateServer {
    /// Create a server from its collaborators.
    pub fn new(
        provider: Arc<dyn HeadlineProvider>,
        filter: Arc<RelevanceFilter>,
        gate: Arc<dyn PaymentGate>,
    ) -> Self {
        Self {
            provider,
            filter,
            gate,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "news",
        description = "Get the current top news headlines, unfiltered. Returns a JSON array of articles (title, description, url, imageUrl, publishedAt, source, ...). Free to call."
    )]
    pub async fn news(&self) -> Result<CallToolResult, McpError> {
        self.run_news().await
    }

    #[tool(
        name = "business_news",
        description = "Get only the top headlines that can affect existing businesses or create new business opportunities, selected by a language model. Returns {\"articles\": [...]}. Paid per call: attach an x402 payment under _meta[\"x402/payment\"]."
    )]
    pub async fn business_news(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let payment = context.meta.get(PAYMENT_META_KEY).cloned();
        self.run_business_news(payment.as_ref()).await
    }
}

impl NewsgateServer {
    /// Build the server and its collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NewsgateError`] if an HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_core::NewsgateConfig;
    /// use newsgate_mcp::tools::NewsgateServer;
    ///
    /// let server = NewsgateServer::from_config(&NewsgateConfig::default()).unwrap();
    /// ```
    pub fn from_config(config: &NewsgateConfig) -> Result<Self, NewsgateError> {
        let provider: Arc<dyn HeadlineProvider> =
            Arc::from(newsgate_headlines::build_provider(&config.provider)?);
        let filter = Arc::new(RelevanceFilter::new(&config.llm)?);
        let gate: Arc<dyn PaymentGate> = if config.payment.enabled {
            Arc::new(FacilitatorGate::new(&config.payment)?)
        } else {
            Arc::new(OpenGate)
        };
        Ok(Self::new(provider, filter, gate))
    }

    /// Body of the `news` tool.
    pub async fn run_news(&self) -> Result<CallToolResult, McpError> {
        match self.provider.fetch_headlines().await {
            Ok(headlines) => {
                info!(
                    tool = "news",
                    provider = self.provider.name(),
                    summary = %headlines.summary,
                    "returning headlines"
                );
                json_result(&headlines.articles)
            }
            Err(e) => {
                warn!(tool = "news", error = %e, "headline fetch failed");
                Ok(error_message(&e.caller_message()))
            }
        }
    }

    /// Body of the `business_news` tool, given the attached payment payload.
    ///
    /// Payment is verified first, settled only when the filter produced a
    /// list.
    pub async fn run_business_news(
        &self,
        payment: Option<&Value>,
    ) -> Result<CallToolResult, McpError> {
        let ticket = match self.gate.verify(payment).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(tool = "business_news", error = %e, "payment gate refused call");
                return Ok(error_result(&e.envelope()));
            }
        };

        let articles = match self.provider.fetch_top_headlines().await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(tool = "business_news", error = %e, "headline fetch failed");
                return Ok(error_message(&e.caller_message()));
            }
        };

        let result = self.filter.filter(&articles).await;
        if let FilterResult::Failed { error } = &result {
            return Ok(error_message(error));
        }

        if let Err(e) = self.gate.settle(ticket).await {
            warn!(tool = "business_news", error = %e, "payment settlement failed");
            return Ok(error_result(&e.envelope()));
        }

        json_result(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_single_text_item() {
        let result = error_message("Failed to fetch top headlines");
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content.len(), 1);
        match &result.content[0].raw {
            RawContent::Text(t) => {
                let parsed: Value = serde_json::from_str(&t.text).unwrap();
                assert_eq!(parsed, serde_json::json!({"error": "Failed to fetch top headlines"}));
            }
            _ => panic!("expected text content"),
        }
    }

    #[test]
    fn from_config_without_payment_uses_open_gate() {
        let mut config = NewsgateConfig::default();
        config.payment.enabled = false;
        let server = NewsgateServer::from_config(&config).unwrap();
        assert_eq!(server.provider.name(), "thenewsapi");
        assert!(!server.filter.is_configured());
    }
}
