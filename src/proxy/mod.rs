//! Row Sources
//!
//! A [`DataProxy`] fetches raw rows for a store. Stores only consume the
//! trait; the concrete proxies here cover in-memory fixtures, local JSON
//! files and HTTP endpoints. Retry policy, if any, belongs to the proxy.

mod file;
mod http;

pub use file::FileProxy;
pub use http::HttpProxy;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::model::RawRow;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Keys searched, in order, when a document is an object and no rows key is configured
const ROW_KEYS: &[&str] = &["data", "rows", "records"];

/// Asynchronous source of raw rows
#[async_trait]
pub trait DataProxy: Send + Sync {
    /// Fetch every row from the source
    async fn load(&self) -> Result<Vec<RawRow>, ProxyError>;

    /// Human-readable source location, for logs
    fn describe(&self) -> String;
}

/// Fixed set of rows, mostly for tests and seeding
#[derive(Debug, Clone, Default)]
pub struct MemoryProxy {
    rows: Vec<RawRow>,
}

impl MemoryProxy {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl DataProxy for MemoryProxy {
    async fn load(&self) -> Result<Vec<RawRow>, ProxyError> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }
}

/// Pick a proxy for `url`
///
/// `http://` and `https://` go over HTTP; `file://` URLs and anything else
/// are treated as local paths.
pub fn proxy_for(url: &str, config: &ProxyConfig) -> Result<Box<dyn DataProxy>, ProxyError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Box::new(HttpProxy::new(url, config)?));
    }
    let path = url.strip_prefix("file://").unwrap_or(url);
    Ok(Box::new(
        FileProxy::new(path).with_rows_key(config.rows_key.clone()),
    ))
}

/// Extract rows from a parsed JSON document
///
/// A top-level array is taken as is. An object is searched for `rows_key`,
/// or for the first of `data`, `rows`, `records` when no key is given.
pub(crate) fn extract_rows(document: JsonValue, rows_key: Option<&str>) -> Result<Vec<RawRow>, ProxyError> {
    let items = match document {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut map) => {
            let found = match rows_key {
                Some(key) => map.remove(key),
                None => ROW_KEYS.iter().find_map(|key| map.remove(*key)),
            };
            match found {
                Some(JsonValue::Array(items)) => items,
                Some(_) => {
                    return Err(ProxyError::Shape(format!(
                        "rows under {} are not an array",
                        rows_key.unwrap_or("the default key")
                    )))
                }
                None => {
                    return Err(ProxyError::Shape(match rows_key {
                        Some(key) => format!("document has no {} key", key),
                        None => format!("document has none of {}", ROW_KEYS.join(", ")),
                    }))
                }
            }
        }
        other => {
            return Err(ProxyError::Shape(format!(
                "expected an array or object, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(at, item)| match item {
            JsonValue::Object(row) => Ok(row),
            other => Err(ProxyError::Shape(format!(
                "row {} is {}, not an object",
                at,
                kind_of(&other)
            ))),
        })
        .collect()
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
