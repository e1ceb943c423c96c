//! Owner of the document collection and the active index.
//!
//! The registry operates on exactly one document at a time; its state
//! is flushed back into the active record before the index may change
//! (commit on navigate).

use tracing::debug;

use crate::error::Error;
use crate::model::Document;
use crate::record::{self, EventSpan, OrderEntry, Record};
use crate::registry::SpanRegistry;
use crate::workspace::InterfaceMode;

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
    /// Index of the document being edited; `None` until the user
    /// navigates somewhere.
    current: Option<usize>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection from a jsonl corpus. Fails wholesale on
    /// the first malformed line.
    pub fn load(content: &str) -> Result<Self, Error> {
        let records = record::parse_jsonl(content)?;
        debug!(documents = records.len(), "corpus loaded");
        Ok(Self {
            docs: records.into_iter().map(Document::new).collect(),
            current: None,
        })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.docs.len() {
            return Err(Error::BadDocumentIndex(index));
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn doc(&self, index: usize) -> Option<&Document> {
        self.docs.get(index)
    }

    pub fn active(&self) -> Option<&Document> {
        self.current.and_then(|i| self.docs.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Document> {
        match self.current {
            Some(i) => self.docs.get_mut(i),
            None => None,
        }
    }

    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    /// Serialize every record back to the jsonl shape.
    pub fn export(&self) -> Result<String, Error> {
        let records: Vec<Record> = self.docs.iter().map(|d| d.record.clone()).collect();
        Ok(record::to_jsonl(&records)?)
    }
}

/// The canonical commit: re-derive the active record's category maps
/// from the live registry. Pure derivation, so calling it twice with
/// no intervening edits yields the same record.
pub fn flush(doc: &mut Document, registry: &SpanRegistry, mode: InterfaceMode) {
    match mode {
        InterfaceMode::Coreference => {
            let mut events = std::collections::BTreeMap::new();
            let mut coref = std::collections::BTreeMap::new();
            for (i, entry) in registry.entries().enumerate() {
                events.insert(i.to_string(), EventSpan::Pair(entry.span));
                if !entry.relative.is_empty() {
                    coref
                        .entry(entry.relative.clone())
                        .or_insert_with(Vec::new)
                        .push(entry.id);
                }
            }
            let mut timex = std::collections::BTreeMap::new();
            for (i, span) in registry.timex_spans().enumerate() {
                timex.insert(i.to_string(), EventSpan::Pair(*span));
            }
            doc.record.events = events;
            doc.record.event_coreference = coref;
            doc.record.timex = timex;
        }
        InterfaceMode::EventOrder | InterfaceMode::Adjudication => {
            let tokens = doc.tokens();
            let mut order = std::collections::BTreeMap::new();
            for (i, entry) in registry.entries().enumerate() {
                let mut span = entry.span;
                // Undo the paragraph-break extension: a span whose
                // leading tokens embed a newline stored one token wide.
                let upto = span.end.min(tokens.len());
                if span.start < upto && tokens[span.start..upto].join(" ").contains('\n') {
                    span.end -= 1;
                }
                order.insert(
                    i.to_string(),
                    OrderEntry {
                        span,
                        label: entry.label.code(),
                        time: entry.time.clone(),
                        branch: entry.relative.clone(),
                        factuality: entry.factuality.clone(),
                    },
                );
            }
            doc.record.event_order = order;
        }
    }
}
