use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// A single news item, normalized across provider response shapes.
///
/// Every field is tri-state: `None` means the provider did not send the
/// field, `Some(None)` means it sent an explicit null, and `Some(Some(v))`
/// carries the value. Absent fields are skipped on serialization so a
/// normalized article round-trips without gaining keys.
///
/// # Examples
///
/// ```
/// use newsgate_core::Article;
///
/// let article = Article {
///     title: Some(Some("Rates hold steady".into())),
///     description: Some(None),
///     ..Article::default()
/// };
/// let json = serde_json::to_value(&article).unwrap();
/// assert_eq!(json["title"], "Rates hold steady");
/// assert!(json["description"].is_null());
/// assert!(json.get("url").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Provider-assigned unique id.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Option<String>>,
    /// Headline text.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Option<String>>,
    /// Short description or lede.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// Link to the full article.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub url: Option<Option<String>>,
    /// Lead image.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    /// Publication timestamp, passed through verbatim.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Option<String>>,
    /// Publishing outlet (domain or display name).
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub source: Option<Option<String>>,
    /// Comma-separated keywords.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Option<String>>,
    /// Opening snippet of the body.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub snippet: Option<Option<String>>,
    /// Article language code.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub language: Option<Option<String>>,
    /// Provider categories, entries kept as sent.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub categories: Option<Option<Vec<Value>>>,
    /// Provider relevance score for the query. Integers stay integers.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<Option<Number>>,
    /// Locale the article was listed under.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub locale: Option<Option<String>>,
    /// Keys outside the fields above, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keeps an explicit `null` as `Some(None)`; a missing key falls back to
/// `#[serde(default)]` and stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Article {
    /// The title as a plain string slice, if one is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use newsgate_core::Article;
    ///
    /// let article = Article { title: Some(Some("Hi".into())), ..Article::default() };
    /// assert_eq!(article.title_text(), Some("Hi"));
    /// assert_eq!(Article::default().title_text(), None);
    /// ```
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().and_then(|t| t.as_deref())
    }
}

/// An ordered list of articles, kept in the provider's return order.
///
/// Serializes as a bare JSON array.
///
/// # Examples
///
/// ```
/// use newsgate_core::{Article, ArticleList};
///
/// let list = ArticleList::from(vec![Article::default(), Article::default()]);
/// assert_eq!(list.len(), 2);
/// assert_eq!(serde_json::to_string(&list).unwrap(), "[{},{}]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleList(Vec<Article>);

impl ArticleList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of articles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no articles.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an article, keeping insertion order.
    pub fn push(&mut self, article: Article) {
        self.0.push(article);
    }

    /// Iterate over the articles in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.0.iter()
    }

    /// Borrow the articles as a slice.
    pub fn as_slice(&self) -> &[Article] {
        &self.0
    }

    /// Consume the list, returning the underlying vector.
    pub fn into_inner(self) -> Vec<Article> {
        self.0
    }
}

impl From<Vec<Article>> for ArticleList {
    fn from(articles: Vec<Article>) -> Self {
        Self(articles)
    }
}

impl FromIterator<Article> for ArticleList {
    fn from_iter<I: IntoIterator<Item = Article>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Article> for ArticleList {
    fn extend<I: IntoIterator<Item = Article>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ArticleList {
    type Item = Article;
    type IntoIter = std::vec::IntoIter<Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ArticleList {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Count and pagination summary synthesized from a fetched list.
///
/// # Examples
///
/// ```
/// use newsgate_core::{Article, ArticleList, FetchSummary};
///
/// let list = ArticleList::from(vec![Article::default(); 3]);
/// let summary = FetchSummary::from_articles(&list);
/// assert_eq!(summary.found, 3);
/// assert_eq!(summary.page, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    /// Articles found.
    pub found: usize,
    /// Articles returned.
    pub returned: usize,
    /// Page size; equal to the count since nothing is paginated.
    pub limit: usize,
    /// Always the first page.
    pub page: usize,
}

impl FetchSummary {
    /// Derive a summary purely from the list's length.
    pub fn from_articles(articles: &ArticleList) -> Self {
        let count = articles.len();
        Self {
            found: count,
            returned: count,
            limit: count,
            page: 1,
        }
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {} | returned {} | limit {} | page {}",
            self.found, self.returned, self.limit, self.page
        )
    }
}

/// Outcome of the relevance filter.
///
/// Either a (possibly empty) list or an error message; never both.
///
/// # Examples
///
/// ```
/// use newsgate_core::{ArticleList, FilterResult};
///
/// let ok = FilterResult::Filtered { articles: ArticleList::new() };
/// assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"articles":[]}"#);
///
/// let failed = FilterResult::Failed { error: "Missing OPENAI_API_KEY".into() };
/// assert_eq!(
///     serde_json::to_string(&failed).unwrap(),
///     r#"{"error":"Missing OPENAI_API_KEY"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterResult {
    /// Articles the model kept.
    Filtered {
        /// Selected articles, in the model's order.
        articles: ArticleList,
    },
    /// The filter could not run.
    Failed {
        /// Human-readable reason.
        error: String,
    },
}

impl FilterResult {
    /// An empty successful result.
    pub fn empty() -> Self {
        Self::Filtered {
            articles: ArticleList::new(),
        }
    }

    /// Whether this is a [`FilterResult::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
