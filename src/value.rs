// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Generic tagged value for semi-structured vendor payloads.
//!
//! Catalog and inventory records arrive as PowerShell `ConvertTo-Json` output,
//! where any field may be a scalar, a list, or a nested object, and where a
//! single-element list is frequently collapsed to the element itself.
//! [`RawValue`] models that shape so identifier extraction can be written as a
//! plain recursive walk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the nested map that metadata enrichment attaches to catalog items.
pub const META_KEY: &str = "Meta";

/// A JSON-like value: string, list of values, or map of string to value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            RawValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Scalar rendered as text. Lists, maps, null and empty strings give `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Scalar as a non-negative integer, accepting all-digit strings.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RawValue::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            RawValue::String(s) => {
                let t = s.trim();
                if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
                    t.parse().ok()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Collect every leaf string at any nesting depth.
    ///
    /// Numbers and booleans are rendered as text; null and empty strings are
    /// skipped. Map values are visited in key order.
    pub fn leaf_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<String>) {
        match self {
            RawValue::Null => {}
            RawValue::List(items) => items.iter().for_each(|v| v.collect_leaves(out)),
            RawValue::Map(map) => map.values().for_each(|v| v.collect_leaves(out)),
            RawValue::String(s) if s.is_empty() => {}
            other => {
                if let Some(t) = other.as_text() {
                    out.push(t);
                }
            }
        }
    }

    /// Look up the first present alias on this map, falling back to the nested
    /// `Meta` map. Returns `None` for non-map values and absent fields.
    pub fn field(&self, aliases: &[&str]) -> Option<&RawValue> {
        let map = self.as_map()?;
        aliases
            .iter()
            .find_map(|name| map.get(*name))
            .or_else(|| {
                let meta = map.get(META_KEY)?.as_map()?;
                aliases.iter().find_map(|name| meta.get(*name))
            })
    }

    /// [`field`](Self::field) rendered as trimmed text.
    pub fn text_field(&self, aliases: &[&str]) -> Option<String> {
        self.field(aliases).and_then(RawValue::as_text)
    }

    /// Clone of the first present alias, or `Null`.
    pub fn owned_field(&self, aliases: &[&str]) -> RawValue {
        self.field(aliases).cloned().unwrap_or_default()
    }

    /// Top-level keys of a map value.
    pub fn keys(&self) -> Vec<&str> {
        self.as_map()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => RawValue::Number(n),
            serde_json::Value::String(s) => RawValue::String(s),
            serde_json::Value::Array(items) => {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(map) => RawValue::Map(
                map.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

/// Normalize a PowerShell JSON document to a list of records: an array is
/// kept, a single object becomes a one-element list, and non-object entries
/// are dropped.
pub fn records_from_json(doc: serde_json::Value) -> Vec<RawValue> {
    let items = match doc {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        other => vec![other],
    };
    items
        .into_iter()
        .filter(|v| v.is_object())
        .map(RawValue::from)
        .collect()
}
