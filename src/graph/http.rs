//! Graph store over the HTTP transactional endpoint.
//!
//! Every statement is sent to `{uri}/db/{database}/tx/commit` as its own
//! auto-committed transaction. Results are requested as a Jolt event
//! stream so temporal values stay typed at every nesting depth.

use crate::config::GraphConfig;
use crate::error::StoreError;
use crate::graph::value::{GraphRecord, GraphValue, Temporal};
use crate::graph::{GraphSession, GraphStore};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

const JOLT_MEDIA_TYPE: &str = "application/vnd.neo4j.jolt+json-seq;strict=true";

/// Record separator that prefixes each event in a json-seq stream.
const RECORD_SEPARATOR: char = '\u{1e}';

/// Store handle. Cloning the inner client is cheap; sessions get their own copy.
pub struct HttpGraphStore {
    http_client: reqwest::Client,
    commit_url: String,
    username: String,
    password: String,
    closed: AtomicBool,
}

impl HttpGraphStore {
    /// Build the store handle from configuration.
    pub fn new(config: &GraphConfig) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Connection(format!("{} ({})", config.uri, e)))?;

        let commit_url = format!(
            "{}/db/{}/tx/commit",
            config.uri.trim_end_matches('/'),
            config.database
        );
        info!("Graph store endpoint: {}", commit_url);

        Ok(Self {
            http_client,
            commit_url,
            username: config.username.clone(),
            password: config.password.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    async fn open_session(
        &self,
        statement_timeout: Duration,
    ) -> Result<Box<dyn GraphSession>, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }

        debug!("Opening graph session (timeout {:?})", statement_timeout);
        Ok(Box::new(HttpGraphSession {
            http_client: self.http_client.clone(),
            commit_url: self.commit_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: statement_timeout,
        }))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Graph store closed");
        }
    }
}

struct HttpGraphSession {
    http_client: reqwest::Client,
    commit_url: String,
    username: String,
    password: String,
    timeout: Duration,
}

#[async_trait]
impl GraphSession for HttpGraphSession {
    async fn run(&mut self, statement: &str) -> Result<Vec<GraphRecord>, StoreError> {
        let body = json!({ "statements": [{ "statement": statement }] });

        let response = self
            .http_client
            .post(&self.commit_url)
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, JOLT_MEDIA_TYPE)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Timeout(self.timeout.as_secs())
                } else if e.is_connect() {
                    StoreError::Connection(self.commit_url.clone())
                } else {
                    StoreError::Connection(format!("{} ({})", self.commit_url, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        parse_jolt_stream(&text)
    }

    async fn close(self: Box<Self>) {
        debug!("Graph session closed");
    }
}

/// Parse a Jolt json-seq response into records.
///
/// The stream carries a `header` event naming the fields, one `data`
/// event per record, and either `summary`/`info` or an `error` event.
pub fn parse_jolt_stream(text: &str) -> Result<Vec<GraphRecord>, StoreError> {
    let mut fields: Vec<String> = Vec::new();
    let mut records = Vec::new();

    for chunk in text.split(|c: char| c == RECORD_SEPARATOR || c == '\n') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let event: Value = serde_json::from_str(chunk)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", e, chunk)))?;

        if let Some(header) = event.get("header") {
            fields = header
                .get("fields")
                .and_then(|f| f.as_array())
                .map(|f| {
                    f.iter()
                        .filter_map(|name| name.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
        } else if let Some(data) = event.get("data") {
            let values = data
                .as_array()
                .ok_or_else(|| StoreError::Malformed("data event is not an array".to_string()))?;

            if values.len() != fields.len() {
                return Err(StoreError::Malformed(format!(
                    "record has {} values for {} fields",
                    values.len(),
                    fields.len()
                )));
            }

            let mut record = GraphRecord::new();
            for (field, value) in fields.iter().zip(values) {
                record.insert(field.clone(), decode_jolt(value)?);
            }
            records.push(record);
        } else if let Some(error) = event.get("error") {
            let first = error
                .get("errors")
                .and_then(|e| e.as_array())
                .and_then(|e| e.first());
            let code = first
                .and_then(|e| e.get("code"))
                .and_then(|c| c.as_str())
                .unwrap_or("Neo.DatabaseError.Unknown");
            let message = first
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(StoreError::Statement {
                code: code.to_string(),
                message: message.to_string(),
            });
        }
    }

    Ok(records)
}

/// Decode one Jolt value. Handles both strict and sparse mode.
pub fn decode_jolt(value: &Value) -> Result<GraphValue, StoreError> {
    match value {
        Value::Null => Ok(GraphValue::Null),
        Value::Bool(b) => Ok(GraphValue::Bool(*b)),
        Value::Number(n) => Ok(n
            .as_i64()
            .map(GraphValue::Int)
            .unwrap_or_else(|| GraphValue::Float(n.as_f64().unwrap_or(f64::NAN)))),
        Value::String(s) => Ok(GraphValue::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(decode_jolt)
            .collect::<Result<Vec<_>, _>>()
            .map(GraphValue::List),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((sigil, inner)) = map.iter().next() {
                    if let Some(decoded) = decode_sigil(sigil, inner)? {
                        return Ok(decoded);
                    }
                }
            }
            decode_map(map)
        }
    }
}

fn decode_sigil(sigil: &str, inner: &Value) -> Result<Option<GraphValue>, StoreError> {
    let decoded = match sigil {
        "?" => GraphValue::Bool(match inner {
            Value::Bool(b) => *b,
            other => other.as_str() == Some("true"),
        }),
        "Z" => GraphValue::Int(
            scalar_text(inner)
                .parse()
                .map_err(|_| StoreError::Malformed(format!("bad integer {}", inner)))?,
        ),
        "R" => GraphValue::Float(
            scalar_text(inner)
                .parse()
                .map_err(|_| StoreError::Malformed(format!("bad float {}", inner)))?,
        ),
        "U" | "@" | "#" => GraphValue::String(scalar_text(inner)),
        "T" => GraphValue::Temporal(Temporal::parse(&scalar_text(inner))),
        "[]" => decode_jolt(inner)?,
        "{}" => match inner {
            Value::Object(map) => decode_map(map)?,
            other => decode_jolt(other)?,
        },
        // Node: [id, labels, properties]
        "()" => entity_properties(inner, 2)?,
        // Relationship: [id, start, type, end, properties]
        "->" | "<-" => entity_properties(inner, 4)?,
        // Path: alternating nodes and relationships
        ".." => decode_jolt(inner)?,
        _ => return Ok(None),
    };
    Ok(Some(decoded))
}

fn decode_map(map: &serde_json::Map<String, Value>) -> Result<GraphValue, StoreError> {
    let mut entries = BTreeMap::new();
    for (key, value) in map {
        entries.insert(key.clone(), decode_jolt(value)?);
    }
    Ok(GraphValue::Map(entries))
}

/// Reduce a node or relationship to its property map.
fn entity_properties(inner: &Value, index: usize) -> Result<GraphValue, StoreError> {
    match inner.as_array().and_then(|parts| parts.get(index)) {
        Some(Value::Object(props)) => decode_map(props),
        Some(_) | None => Err(StoreError::Malformed(format!(
            "entity without properties: {}",
            inner
        ))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
