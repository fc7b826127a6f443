use newsgate_core::{Article, ArticleList, NewsgateError};
use serde_json::Value;

const SYSTEM_PROMPT: &str = "\
You are a business news analyst. From the articles you are given, select only \
articles that can affect existing businesses or create new business opportunities. \
Ignore sports, celebrity, entertainment, and lifestyle stories unless they have a \
clear commercial impact.";

const OUTPUT_INSTRUCTIONS: &str = "\
Return strictly valid JSON and nothing else. Respond with an object of the form \
{\"articles\": [ ... ]} (a bare JSON array is also accepted). Every element must be \
one of the article objects from the input, copied exactly: keep all of its original \
fields and values, do not rewrite titles or descriptions, and do not invent articles. \
If no article qualifies, return {\"articles\": []}.";

/// Build the system prompt for the relevance filter.
///
/// # Examples
///
/// ```
/// use newsgate_filter::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("affect existing businesses"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt embedding the full serialized article list.
///
/// # Errors
///
/// Returns [`NewsgateError::Serialization`] if the list cannot be encoded.
///
/// # Examples
///
/// ```
/// use newsgate_core::{Article, ArticleList};
/// use newsgate_filter::prompt::build_filter_prompt;
///
/// let list = ArticleList::from(vec![Article {
///     title: Some(Some("Port strike halts shipments".into())),
///     ..Article::default()
/// }]);
/// let prompt = build_filter_prompt(&list).unwrap();
/// assert!(prompt.contains("Port strike halts shipments"));
/// ```
pub fn build_filter_prompt(articles: &ArticleList) -> Result<String, NewsgateError> {
    let json = serde_json::to_string_pretty(articles)?;
    Ok(format!(
        "Articles:\n\n```json\n{json}\n```\n\n{OUTPUT_INSTRUCTIONS}"
    ))
}

/// The model's answer after shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResponse {
    /// The model answered with a bare array of articles.
    Sequence(ArticleList),
    /// The model answered with `{"articles": [...]}`.
    Keyed {
        /// Articles under the `articles` key.
        articles: ArticleList,
    },
    /// Not JSON, or JSON of the wrong shape.
    Malformed(String),
}

impl FilterResponse {
    /// Selected articles; a malformed response selects nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_filter::prompt::FilterResponse;
    ///
    /// let response = FilterResponse::Malformed("not json".into());
    /// assert!(response.into_articles().is_empty());
    /// ```
    pub fn into_articles(self) -> ArticleList {
        match self {
            Self::Sequence(articles) | Self::Keyed { articles } => articles,
            Self::Malformed(_) => ArticleList::new(),
        }
    }
}

/// Validate the model's text response.
///
/// Handles markdown code fences around JSON. A response is accepted when it
/// is an array of article objects, or an object holding such an array under
/// `articles`. Accepted objects keep their numbers and any extra keys as
/// the model wrote them. Anything else, including a single non-object entry or a field
/// of the wrong type, is [`FilterResponse::Malformed`].
///
/// # Examples
///
/// ```
/// use newsgate_filter::prompt::{parse_filter_response, FilterResponse};
///
/// let response = parse_filter_response(r#"{"articles": [{"title": "Fed holds"}]}"#);
/// assert!(matches!(response, FilterResponse::Keyed { ref articles } if articles.len() == 1));
///
/// let response = parse_filter_response("Sure! Here are the articles.");
/// assert!(matches!(response, FilterResponse::Malformed(_)));
/// ```
pub fn parse_filter_response(response: &str) -> FilterResponse {
    let cleaned = strip_code_fences(response);

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(e) => return FilterResponse::Malformed(format!("invalid JSON: {e}")),
    };

    match value {
        Value::Array(items) => match articles_from(items) {
            Ok(articles) => FilterResponse::Sequence(articles),
            Err(reason) => FilterResponse::Malformed(reason),
        },
        Value::Object(mut obj) => match obj.remove("articles") {
            Some(Value::Array(items)) => match articles_from(items) {
                Ok(articles) => FilterResponse::Keyed { articles },
                Err(reason) => FilterResponse::Malformed(reason),
            },
            Some(_) => FilterResponse::Malformed("`articles` is not an array".into()),
            None => FilterResponse::Malformed("object has no `articles` key".into()),
        },
        _ => FilterResponse::Malformed("expected an array or an object".into()),
    }
}

fn articles_from(items: Vec<Value>) -> Result<ArticleList, String> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(format!("entry {i} is not an object"));
            }
            serde_json::from_value::<Article>(item).map_err(|e| format!("entry {i}: {e}"))
        })
        .collect()
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // the opening line may carry a language tag of any case
    match inner.split_once('\n') {
        Some((tag, body)) if !tag.trim_start().starts_with(['[', '{']) => body.trim(),
        _ => inner.trim(),
    }
}
