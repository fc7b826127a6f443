//! MCP server interface exposing the headline tools.
//!
//! Implements a Model Context Protocol server using rmcp that exposes
//! `news` and the pay-per-call `business_news` over stdio transport.
//!
//! # Examples
//!
//! ```no_run
//! use newsgate_core::NewsgateConfig;
//!
//! # async fn example() -> Result<(), newsgate_core::NewsgateError> {
//! newsgate_mcp::server::run_server(&NewsgateConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod payment;
pub mod server;
pub mod tools;
