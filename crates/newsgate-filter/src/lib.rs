//! LLM-backed relevance filtering of headlines.
//!
//! Provides the chat client, prompt construction and response validation,
//! and [`RelevanceFilter`], which ties them together with a
//! fail-open-to-empty policy for bad model output.

pub mod filter;
pub mod llm;
pub mod prompt;

pub use filter::RelevanceFilter;
