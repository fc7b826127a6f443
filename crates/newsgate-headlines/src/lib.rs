//! Headline fetching and normalization.
//!
//! [`HeadlineProvider`] is the capability every news source implements:
//! one method returning the canonical [`newsgate_core::ArticleList`].
//! Two adapters are provided, [`thenewsapi::TheNewsApiProvider`] and
//! [`newsapi::NewsApiProvider`]; [`build_provider`] picks one from config.
//!
//! # Examples
//!
//! ```no_run
//! use newsgate_core::NewsgateConfig;
//!
//! # async fn example() -> Result<(), newsgate_core::NewsgateError> {
//! let config = NewsgateConfig::default().with_process_env()?;
//! let provider = newsgate_headlines::build_provider(&config.provider)?;
//! let articles = provider.fetch_top_headlines().await?;
//! println!("{} headlines", articles.len());
//! # Ok(())
//! # }
//! ```

pub mod newsapi;
pub mod normalize;
pub mod provider;
pub mod thenewsapi;

pub use provider::{build_provider, HeadlineProvider, Headlines};
