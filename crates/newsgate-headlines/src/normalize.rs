//! Field-level helpers shared by the provider adapters.
//!
//! Each helper keeps the absent / null / value distinction of
//! [`Article`] fields: a missing key yields `None`, an explicit null yields
//! `Some(None)`.

use newsgate_core::{Article, ArticleList, NewsgateError};
use serde_json::{Map, Number, Value};
use tracing::warn;

/// Read a string-like field.
///
/// Numbers and booleans are stringified; arrays and objects have no string
/// form and resolve to an explicit null.
///
/// # Examples
///
/// ```
/// use newsgate_headlines::normalize::text_field;
///
/// let obj = serde_json::json!({"title": "Hi", "description": null});
/// let obj = obj.as_object().unwrap();
/// assert_eq!(text_field(obj, "title"), Some(Some("Hi".to_string())));
/// assert_eq!(text_field(obj, "description"), Some(None));
/// assert_eq!(text_field(obj, "url"), None);
/// ```
pub fn text_field(obj: &Map<String, Value>, key: &str) -> Option<Option<String>> {
    obj.get(key).map(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Read a numeric field, keeping its integer or float form. Non-numeric
/// values resolve to an explicit null.
///
/// # Examples
///
/// ```
/// use newsgate_headlines::normalize::number_field;
///
/// let obj = serde_json::json!({"score": 15});
/// let score = number_field(obj.as_object().unwrap(), "score");
/// assert_eq!(score, Some(Some(15.into())));
/// ```
pub fn number_field(obj: &Map<String, Value>, key: &str) -> Option<Option<Number>> {
    obj.get(key).map(|value| match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    })
}

/// Read a list field. Entries are kept as sent; a non-list value resolves
/// to an explicit null.
pub fn list_field(obj: &Map<String, Value>, key: &str) -> Option<Option<Vec<Value>>> {
    obj.get(key).map(|value| value.as_array().cloned())
}

/// Resolve the `source` field.
///
/// A plain string passes through. An object yields its `domain`, falling
/// back to `name`; an object with neither resolves to an explicit null.
///
/// # Examples
///
/// ```
/// use newsgate_headlines::normalize::source_field;
///
/// let obj = serde_json::json!({"source": {"id": null, "name": "Reuters"}});
/// assert_eq!(
///     source_field(obj.as_object().unwrap()),
///     Some(Some("Reuters".to_string()))
/// );
/// ```
pub fn source_field(obj: &Map<String, Value>) -> Option<Option<String>> {
    obj.get("source").map(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => ["domain", "name"]
            .iter()
            .find_map(|key| inner.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    })
}

/// Collect articles stored under `key` in a provider response body.
///
/// Two shapes are recognized: a flat array, or an object mapping category
/// names to arrays. Grouped lists are concatenated in the object's
/// iteration order (document order). Entries that are not JSON objects are
/// skipped.
///
/// # Errors
///
/// Returns [`NewsgateError::Upstream`] when `key` is missing or holds
/// neither shape.
///
/// # Examples
///
/// ```
/// use newsgate_core::Article;
/// use newsgate_headlines::normalize::{collect_articles, text_field};
///
/// let body = serde_json::json!({"data": {"business": [{"title": "a1"}], "tech": [{"title": "a2"}]}});
/// let list = collect_articles(&body, "data", |obj| Article {
///     title: text_field(obj, "title"),
///     ..Article::default()
/// })
/// .unwrap();
/// assert_eq!(list.len(), 2);
/// ```
pub fn collect_articles<F>(body: &Value, key: &str, map: F) -> Result<ArticleList, NewsgateError>
where
    F: Fn(&Map<String, Value>) -> Article,
{
    let mut articles = ArticleList::new();
    match body.get(key) {
        Some(Value::Array(items)) => push_objects(&mut articles, items, &map),
        Some(Value::Object(groups)) => {
            for (category, value) in groups {
                match value {
                    Value::Array(items) => push_objects(&mut articles, items, &map),
                    _ => warn!(%category, "skipping non-list category entry"),
                }
            }
        }
        Some(other) => {
            return Err(NewsgateError::upstream(format!(
                "unexpected `{key}` value: expected list or object, got {}",
                json_kind(other)
            )))
        }
        None => {
            return Err(NewsgateError::upstream(format!(
                "response has no `{key}` field"
            )))
        }
    }
    Ok(articles)
}

fn push_objects<F>(articles: &mut ArticleList, items: &[Value], map: &F)
where
    F: Fn(&Map<String, Value>) -> Article,
{
    for item in items {
        match item.as_object() {
            Some(obj) => articles.push(map(obj)),
            None => warn!(kind = json_kind(item), "skipping non-object article entry"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn titled(obj: &Map<String, Value>) -> Article {
        Article {
            title: text_field(obj, "title"),
            ..Article::default()
        }
    }

    fn titles(list: &ArticleList) -> Vec<&str> {
        list.iter().filter_map(Article::title_text).collect()
    }

    #[test]
    fn text_field_stringifies_scalars() {
        let obj = json!({"n": 3, "b": true, "a": [1]});
        let obj = obj.as_object().unwrap();
        assert_eq!(text_field(obj, "n"), Some(Some("3".into())));
        assert_eq!(text_field(obj, "b"), Some(Some("true".into())));
        assert_eq!(text_field(obj, "a"), Some(None));
    }

    #[test]
    fn number_and_list_fields() {
        let obj = json!({"score": 12.5, "rank": 15, "bad": "x", "cats": ["business", null, 3], "none": null});
        let obj = obj.as_object().unwrap();
        assert_eq!(number_field(obj, "score"), Number::from_f64(12.5).map(Some));
        assert_eq!(number_field(obj, "rank"), Some(Some(15.into())));
        assert_eq!(number_field(obj, "bad"), Some(None));
        assert_eq!(number_field(obj, "missing"), None);
        assert_eq!(
            list_field(obj, "cats"),
            Some(Some(vec![json!("business"), Value::Null, json!(3)]))
        );
        assert_eq!(list_field(obj, "none"), Some(None));
    }

    #[test]
    fn source_prefers_domain_over_name() {
        let obj = json!({"source": {"domain": "ft.com", "name": "Financial Times"}});
        assert_eq!(
            source_field(obj.as_object().unwrap()),
            Some(Some("ft.com".into()))
        );
    }

    #[test]
    fn source_object_without_known_keys_is_null() {
        let obj = json!({"source": {"id": "x"}});
        assert_eq!(source_field(obj.as_object().unwrap()), Some(None));

        let obj = json!({"title": "no source"});
        assert_eq!(source_field(obj.as_object().unwrap()), None);
    }

    #[test]
    fn flat_list_keeps_order() {
        let body = json!({"data": [{"title": "b"}, {"title": "a"}, {"title": "c"}]});
        let list = collect_articles(&body, "data", titled).unwrap();
        assert_eq!(titles(&list), vec!["b", "a", "c"]);
    }

    #[test]
    fn grouped_lists_are_concatenated_in_document_order() {
        let body: Value = serde_json::from_str(
            r#"{"data": {"tech": [{"title": "t1"}], "business": [{"title": "b1"}, {"title": "b2"}]}}"#,
        )
        .unwrap();
        let list = collect_articles(&body, "data", titled).unwrap();
        assert_eq!(titles(&list), vec!["t1", "b1", "b2"]);
    }

    #[test]
    fn non_list_categories_and_non_objects_are_skipped() {
        let body = json!({"data": {"business": [{"title": "a"}, 7], "meta": "x"}});
        let list = collect_articles(&body, "data", titled).unwrap();
        assert_eq!(titles(&list), vec!["a"]);
    }

    #[test]
    fn unrecognized_shape_is_upstream_error() {
        let err = collect_articles(&json!({"data": "nope"}), "data", titled).unwrap_err();
        assert!(matches!(err, NewsgateError::Upstream { .. }));

        let err = collect_articles(&json!({"other": []}), "data", titled).unwrap_err();
        assert!(err.to_string().contains("no `data` field"));
    }
}
