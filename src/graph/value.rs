//! Values returned by the graph store and their normalization.
//!
//! The store hands back [`GraphValue`]s, which may carry engine-typed
//! temporal values at any depth. Before a record leaves the pipeline it
//! is normalized into plain JSON with every temporal rendered as one
//! canonical ISO-8601 string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// One record as produced by the store, keyed by column name.
pub type GraphRecord = BTreeMap<String, GraphValue>;

/// One record after normalization; this is what leaves the pipeline.
pub type ResultRecord = Map<String, Value>;

/// A value inside a store record.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Temporal(Temporal),
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
}

/// An engine temporal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Temporal {
    DateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    Date(NaiveDate),
    LocalTime(NaiveTime),
    /// Durations, zoned times and anything else chrono cannot model.
    Other(String),
}

impl Temporal {
    /// Parse the store's textual form of a temporal value.
    pub fn parse(raw: &str) -> Self {
        // Zoned values carry a trailing region id: `...+01:00[Europe/London]`.
        let text = raw.split('[').next().unwrap_or(raw).trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Temporal::DateTime(dt);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Temporal::LocalDateTime(dt);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Temporal::Date(date);
        }
        for fmt in ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"] {
            if let Ok(time) = NaiveTime::parse_from_str(text, fmt) {
                return Temporal::LocalTime(time);
            }
        }

        Temporal::Other(raw.to_string())
    }

    /// Canonical ISO-8601 rendering.
    pub fn to_iso8601(&self) -> String {
        match self {
            Temporal::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Temporal::LocalDateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Temporal::Date(date) => date.format("%Y-%m-%d").to_string(),
            Temporal::LocalTime(time) => time.format("%H:%M:%S%.f").to_string(),
            Temporal::Other(raw) => raw.clone(),
        }
    }
}

impl GraphValue {
    /// Convert to plain JSON, formatting temporals as ISO-8601 strings.
    pub fn normalize(&self) -> Value {
        match self {
            GraphValue::Null => Value::Null,
            GraphValue::Bool(b) => Value::Bool(*b),
            GraphValue::Int(i) => Value::from(*i),
            GraphValue::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            GraphValue::String(s) => Value::String(s.clone()),
            GraphValue::Temporal(t) => Value::String(t.to_iso8601()),
            GraphValue::List(items) => Value::Array(items.iter().map(Self::normalize).collect()),
            GraphValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.normalize()))
                    .collect(),
            ),
        }
    }
}

/// Normalize a whole store record.
pub fn normalize_record(record: &GraphRecord) -> ResultRecord {
    record
        .iter()
        .map(|(key, value)| (key.clone(), value.normalize()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created_at() -> GraphValue {
        GraphValue::Temporal(Temporal::parse("2024-03-01T10:15:30Z"))
    }

    #[test]
    fn test_temporal_parse_variants() {
        assert!(matches!(
            Temporal::parse("2024-03-01T10:15:30.5+02:00"),
            Temporal::DateTime(_)
        ));
        assert!(matches!(
            Temporal::parse("2024-03-01T10:15:30"),
            Temporal::LocalDateTime(_)
        ));
        assert!(matches!(Temporal::parse("2024-03-01"), Temporal::Date(_)));
        assert!(matches!(Temporal::parse("10:15:30"), Temporal::LocalTime(_)));
        assert_eq!(Temporal::parse("P14DT16H"), Temporal::Other("P14DT16H".to_string()));
    }

    #[test]
    fn test_zoned_datetime_drops_region_id() {
        let t = Temporal::parse("2024-03-01T10:15:30+01:00[Europe/Paris]");
        assert_eq!(t.to_iso8601(), "2024-03-01T10:15:30+01:00");
    }

    #[test]
    fn test_utc_datetime_renders_with_z() {
        assert_eq!(
            Temporal::parse("2024-03-01T10:15:30Z").to_iso8601(),
            "2024-03-01T10:15:30Z"
        );
        assert_eq!(
            Temporal::parse("2024-03-01T10:15:30+00:00").to_iso8601(),
            "2024-03-01T10:15:30Z"
        );
    }

    #[test]
    fn test_temporal_identical_at_any_depth() {
        let mut nested = BTreeMap::new();
        nested.insert("createdDateTime".to_string(), created_at());

        let mut record = GraphRecord::new();
        record.insert("top".to_string(), created_at());
        record.insert("node".to_string(), GraphValue::Map(nested));
        record.insert(
            "history".to_string(),
            GraphValue::List(vec![GraphValue::List(vec![created_at()])]),
        );

        let normalized = normalize_record(&record);
        let expected = json!("2024-03-01T10:15:30Z");
        assert_eq!(normalized["top"], expected);
        assert_eq!(normalized["node"]["createdDateTime"], expected);
        assert_eq!(normalized["history"][0][0], expected);
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        assert_eq!(GraphValue::Float(f64::NAN).normalize(), Value::Null);
        assert_eq!(GraphValue::Float(1.5).normalize(), json!(1.5));
    }
}
