//! # Query Model
//!
//! Typed filters, patches and aggregation pipelines understood by every
//! [`DocumentStore`](crate::DocumentStore) adapter.

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

// =============================================================================
// FILTER
// =============================================================================

/// Conjunction of field equality conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Add another equality condition.
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

// =============================================================================
// PATCH
// =============================================================================

/// Field assignments and integer increments applied to a matched document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    set: Document,
    inc: Vec<(String, i64)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch that assigns every field of `fields`.
    pub fn set_all(fields: Document) -> Self {
        Self {
            set: fields,
            inc: Vec::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn inc(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.inc.push((field.into(), delta));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty()
    }

    /// Apply the patch in place. Increments on a missing field start from zero.
    pub fn apply(&self, doc: &mut Document) {
        for (field, value) in &self.set {
            doc.insert(field.clone(), value.clone());
        }
        for (field, delta) in &self.inc {
            let next = match doc.get(field) {
                Some(Value::Number(n)) if n.is_i64() || n.is_u64() => {
                    Value::from(n.as_i64().unwrap_or(i64::MAX).saturating_add(*delta))
                }
                Some(Value::Number(n)) => {
                    Value::from(n.as_f64().unwrap_or_default() + *delta as f64)
                }
                _ => Value::from(*delta),
            };
            doc.insert(field.clone(), next);
        }
    }
}

// =============================================================================
// FIND OPTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Ordering and truncation for `find_with`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn newest_first(field: impl Into<String>, limit: usize) -> Self {
        Self {
            sort: Some((field.into(), SortOrder::Descending)),
            limit: Some(limit),
        }
    }

    pub fn limit(limit: usize) -> Self {
        Self {
            sort: None,
            limit: Some(limit),
        }
    }
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Reducer computed over every document reaching a [`Group`] stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Mean of the numeric values of a field; null when none are numeric.
    Avg(String),
    /// Number of documents.
    Count,
}

/// Single-bucket grouping (`_id: null`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub accumulators: Vec<(String, Accumulator)>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, output: impl Into<String>, accumulator: Accumulator) -> Self {
        self.accumulators.push((output.into(), accumulator));
        self
    }

    /// Reduce `docs` into a single output document. Empty input yields nothing.
    pub fn reduce(&self, docs: &[Document]) -> Option<Document> {
        if docs.is_empty() {
            return None;
        }

        let mut out = Document::new();
        out.insert("_id".to_string(), Value::Null);
        for (name, acc) in &self.accumulators {
            let value = match acc {
                Accumulator::Count => Value::from(docs.len() as u64),
                Accumulator::Avg(field) => {
                    let (sum, count) = numeric_values(docs, field)
                        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                    if count == 0 {
                        Value::Null
                    } else {
                        Value::from(sum / count as f64)
                    }
                }
            };
            out.insert(name.clone(), value);
        }
        Some(out)
    }
}

/// One step of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Group(Group),
}

pub type Pipeline = Vec<Stage>;

fn numeric_values<'a>(docs: &'a [Document], field: &'a str) -> impl Iterator<Item = f64> + 'a {
    docs.iter()
        .filter_map(move |d| d.get(field).and_then(Value::as_f64))
}

/// Total order used for sorting field values.
///
/// Nulls and missing values sort first, then numbers, then strings. Strings
/// that both parse as RFC 3339 timestamps compare chronologically.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(x),
                DateTime::<FixedOffset>::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_conjunction() {
        let d = doc(json!({ "status": "online", "node_type": "general" }));
        assert!(Filter::all().matches(&d));
        assert!(Filter::eq("status", "online").matches(&d));
        assert!(!Filter::eq("status", "online").and("node_type", "camera").matches(&d));
        assert!(!Filter::eq("missing", "x").matches(&d));
    }

    #[test]
    fn test_patch_set_and_inc() {
        let mut d = doc(json!({ "name": "a", "workload_count": 2 }));
        Patch::new()
            .set("name", "b")
            .inc("workload_count", 1)
            .inc("fresh", 3)
            .apply(&mut d);
        assert_eq!(d["name"], "b");
        assert_eq!(d["workload_count"], 3);
        assert_eq!(d["fresh"], 3);
    }

    #[test]
    fn test_group_averages_skip_non_numeric() {
        let docs = vec![
            doc(json!({ "cpu": 10.0 })),
            doc(json!({ "cpu": 30.0 })),
            doc(json!({ "cpu": "n/a" })),
        ];
        let out = Group::new()
            .with("avg_cpu", Accumulator::Avg("cpu".into()))
            .with("n", Accumulator::Count)
            .reduce(&docs)
            .unwrap();
        assert_eq!(out["avg_cpu"], 20.0);
        assert_eq!(out["n"], 3);
        assert_eq!(out["_id"], Value::Null);
    }

    #[test]
    fn test_group_empty_input() {
        let group = Group::new().with("n", Accumulator::Count);
        assert!(group.reduce(&[]).is_none());
    }

    #[test]
    fn test_timestamps_compare_chronologically() {
        // Lexically "...00Z" sorts after "...00.5Z"; chronologically it is earlier.
        let whole = json!("2024-01-01T00:00:00Z");
        let half = json!("2024-01-01T00:00:00.5Z");
        assert_eq!(compare_values(Some(&whole), Some(&half)), Ordering::Less);
        let next = json!("2024-01-01T00:00:01Z");
        assert_eq!(compare_values(Some(&next), Some(&half)), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&half)), Ordering::Less);
    }
}
