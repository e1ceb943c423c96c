//! Persisted record format: newline-delimited JSON, one document per
//! line. Category maps use ordinal string keys; unknown optional
//! fields ride along untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{LabelType, TokenSpan};

/// An `events`/`timex` map value: a bare span pair, optionally tagged
/// with a label code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EventSpan {
    Pair(TokenSpan),
    Tagged {
        span: TokenSpan,
        #[serde(rename = "type", default)]
        label: u8,
    },
}

impl EventSpan {
    pub fn span(&self) -> TokenSpan {
        match *self {
            EventSpan::Pair(span) => span,
            EventSpan::Tagged { span, .. } => span,
        }
    }

    pub fn label(&self) -> LabelType {
        match self {
            EventSpan::Pair(_) => LabelType::Begin,
            EventSpan::Tagged { label, .. } => LabelType::from_code(*label),
        }
    }
}

/// An `event_order` map value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderEntry {
    pub span: TokenSpan,
    #[serde(rename = "type", default)]
    pub label: u8,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub factuality: String,
}

/// Per-annotator adjudication data: chunk ordinal -> entry ordinal ->
/// entry.
pub type AnnotatorChunks = BTreeMap<String, BTreeMap<String, OrderEntry>>;

fn default_id() -> serde_json::Value {
    serde_json::Value::String(String::new())
}

/// One document record. Only the fields relevant to the active
/// interface mode are meaningful; the rest default to empty and are
/// preserved as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(default = "default_id")]
    pub id: serde_json::Value,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub events: BTreeMap<String, EventSpan>,
    #[serde(default)]
    pub event_order: BTreeMap<String, OrderEntry>,
    #[serde(default)]
    pub timex: BTreeMap<String, EventSpan>,
    #[serde(default)]
    pub event_coreference: BTreeMap<String, Vec<usize>>,
    #[serde(default)]
    pub invisible_events: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a1: Option<AnnotatorChunks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a2: Option<AnnotatorChunks>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            id: default_id(),
            text: String::new(),
            events: BTreeMap::new(),
            event_order: BTreeMap::new(),
            timex: BTreeMap::new(),
            event_coreference: BTreeMap::new(),
            invisible_events: Vec::new(),
            annotators: None,
            a1: None,
            a2: None,
        }
    }
}

impl Record {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Ordinal map entries in numeric key order. Non-numeric keys sort
/// after the numeric ones, lexically.
pub fn ordered<T>(map: &BTreeMap<String, T>) -> Vec<&T> {
    let mut keyed: Vec<(&String, &T)> = map.iter().collect();
    keyed.sort_by(|(a, _), (b, _)| match (a.parse::<usize>(), b.parse::<usize>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// Parse a whole corpus file. Any unparsable line fails the import as
/// a whole; there is no partial load.
pub fn parse_jsonl(content: &str) -> Result<Vec<Record>, Error> {
    content
        .trim()
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim_end_matches('\r'))
                .map_err(|source| Error::MalformedRecord {
                    line: i + 1,
                    source,
                })
        })
        .collect()
}

/// Serialize records back to the jsonl shape, CRLF line endings.
pub fn to_jsonl(records: &[Record]) -> serde_json::Result<String> {
    let lines: Vec<String> = records
        .iter()
        .map(serde_json::to_string)
        .collect::<serde_json::Result<_>>()?;
    Ok(lines.join("\r\n"))
}
