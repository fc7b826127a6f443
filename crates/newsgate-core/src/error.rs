/// Message shown to callers whenever the headline provider fails.
pub const UPSTREAM_MESSAGE: &str = "Failed to fetch top headlines";

/// Errors that can occur across the newsgate workspace.
///
/// Library crates return this type directly; the binary crate reports it
/// through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use newsgate_core::NewsgateError;
///
/// let err = NewsgateError::Config("Missing NEWS_API_KEY".into());
/// assert!(err.to_string().contains("Missing NEWS_API_KEY"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum NewsgateError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("set the value in newsgate.toml or export the matching env var"))]
    Config(String),

    /// Headline provider unreachable, non-success status, or unrecognized body.
    #[error("Failed to fetch top headlines: {detail}")]
    Upstream {
        /// What went wrong, for logs. Never shown to tool callers.
        detail: String,
    },

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Structured text that did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Payment facilitator or payment payload failure.
    #[error("payment error: {0}")]
    Payment(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NewsgateError {
    /// Shorthand for an [`NewsgateError::Upstream`] with the given detail.
    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::Upstream {
            detail: detail.into(),
        }
    }

    /// Text placed in the `{ "error": ... }` envelope returned to callers.
    ///
    /// Upstream failures collapse to a fixed message; configuration errors
    /// carry their raw message so callers see e.g. `Missing OPENAI_API_KEY`.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_core::NewsgateError;
    ///
    /// let err = NewsgateError::upstream("HTTP 500");
    /// assert_eq!(err.caller_message(), "Failed to fetch top headlines");
    ///
    /// let err = NewsgateError::Config("Missing OPENAI_API_KEY".into());
    /// assert_eq!(err.caller_message(), "Missing OPENAI_API_KEY");
    /// ```
    pub fn caller_message(&self) -> String {
        match self {
            Self::Upstream { .. } => UPSTREAM_MESSAGE.to_string(),
            Self::Config(msg) | Self::Payment(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
