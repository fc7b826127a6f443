//! Core types, configuration, and error handling for newsgate.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`NewsgateError`]: unified error type using `thiserror`
//! - [`NewsgateConfig`]: configuration loaded from `newsgate.toml` plus env
//! - Shared types: [`Article`], [`ArticleList`], [`FetchSummary`], [`FilterResult`]

mod config;
mod error;
mod types;

pub use config::{
    address_env_var, LlmConfig, NetworkConfig, NewsgateConfig, PaymentConfig, ProviderConfig,
    ProviderKind,
};
pub use error::{NewsgateError, UPSTREAM_MESSAGE};
pub use types::{Article, ArticleList, FetchSummary, FilterResult};

/// A convenience `Result` type for newsgate operations.
pub type Result<T> = std::result::Result<T, NewsgateError>;
