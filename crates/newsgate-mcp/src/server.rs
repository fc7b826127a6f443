//! MCP server setup and lifecycle.
//!
//! Provides [`run_server`] which starts the stdio-based MCP server,
//! registering the headline tools and blocking until the client disconnects.

use newsgate_core::{NewsgateConfig, NewsgateError};
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};
use tracing::info;

use crate::tools::NewsgateServer;

const SERVER_INSTRUCTIONS: &str = "\
newsgate serves current top news headlines:\n\
- news: all top headlines, unfiltered (free)\n\
- business_news: only headlines that matter for businesses, selected by an LLM (paid per call)";

#[tool_handler]
impl ServerHandler for NewsgateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "newsgate".to_string(),
                title: Some("newsgate headlines".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some("Top headlines with pay-per-call business filtering".to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the MCP server on stdio transport.
///
/// This is called by the `newsgate serve` CLI subcommand. It blocks until
/// the client closes stdin.
///
/// # Errors
///
/// Returns [`NewsgateError`] if the server fails to initialize or encounters
/// a transport error.
///
/// # Examples
///
/// ```no_run
/// use newsgate_core::NewsgateConfig;
///
/// # async fn example() -> Result<(), newsgate_core::NewsgateError> {
/// let config = NewsgateConfig::default().with_process_env()?;
/// newsgate_mcp::server::run_server(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server(config: &NewsgateConfig) -> Result<(), NewsgateError> {
    let server = NewsgateServer::from_config(config)?;
    info!(
        provider = %config.provider.kind,
        payment = config.payment.enabled,
        "starting MCP server on stdio"
    );
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| NewsgateError::Config(format!("MCP server failed to start: {e}")))?;

    service
        .waiting()
        .await
        .map_err(|e| NewsgateError::Config(format!("MCP server error: {e}")))?;

    info!("MCP client disconnected");
    Ok(())
}
