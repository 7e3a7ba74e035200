//! Parameter merging.
//!
//! Every request is reduced to a single JSON object before validation. The
//! layering depends on the method:
//!
//! | Method | Layers, lowest precedence first |
//! |--------|---------------------------------|
//! | `GET`, `DELETE` | query, path |
//! | `POST`, `PUT`, `PATCH` | path, query, body |
//!
//! Later layers overwrite earlier ones key by key.

use serde_json::{Map, Value};
use tokendsl_router::{HttpMethod, Params, PathTemplate};

use crate::schema::{ValidationIssue, ValidationIssues, ROOT_PATH};

/// Parses a raw query string into a JSON object.
///
/// Every value is a string. A key that appears more than once becomes an
/// array of strings in order of appearance.
///
/// ```
/// use serde_json::json;
/// use tokendsl_core::merge::parse_query;
///
/// let query = parse_query("tag=a&page=2&tag=b").unwrap();
/// assert_eq!(serde_json::Value::Object(query), json!({"tag": ["a", "b"], "page": "2"}));
/// ```
pub fn parse_query(raw: &str) -> Result<Map<String, Value>, ValidationIssues> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).map_err(|e| {
        ValidationIssues::single(ROOT_PATH, format!("malformed query string: {e}"))
    })?;

    let mut query = Map::new();
    for (key, value) in pairs {
        match query.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                query.insert(key, Value::String(value));
            }
        }
    }
    Ok(query)
}

/// Builds the merged input for one request.
///
/// Only captures whose names appear in `template` are taken, percent-decoded.
/// A capture that is not UTF-8 once decoded is reported at its parameter
/// name. For mutating methods a body that is neither an object nor null is
/// reported at `$`; for `GET` and `DELETE` the body is ignored.
pub fn merge(
    template: &PathTemplate,
    captures: &Params,
    query: Map<String, Value>,
    body: Option<Value>,
    method: HttpMethod,
) -> Result<Map<String, Value>, ValidationIssues> {
    let mut path = Map::new();
    let mut issues = ValidationIssues::new();
    for (name, raw) in captures.iter().filter(|(name, _)| template.has_param(name)) {
        match urlencoding::decode(raw) {
            Ok(value) => {
                path.insert(name.to_string(), Value::String(value.into_owned()));
            }
            Err(_) => issues.push(ValidationIssue::new(
                name,
                "path parameter is not valid UTF-8 once percent-decoded",
            )),
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    if !method.carries_body() {
        let mut merged = query;
        merged.extend(path);
        return Ok(merged);
    }

    let body = match body {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            return Err(ValidationIssues::single(
                ROOT_PATH,
                format!(
                    "request body must be a JSON object, got {}",
                    crate::schema::value_type_name(&other)
                ),
            ))
        }
    };

    let mut merged = path;
    merged.extend(query);
    merged.extend(body);
    Ok(merged)
}
