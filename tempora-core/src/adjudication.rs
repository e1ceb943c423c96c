//! Dual-annotator comparison layouts.
//!
//! Adjudication mode shows, per text chunk, one mini timeline per
//! annotator, computed by the same layout engine as the main view.
//! Mismatched chunk counts are tolerated best-effort over the shorter
//! side.

use std::collections::BTreeMap;

use tracing::warn;

use crate::model::{Document, LabelType};
use crate::record::{ordered, OrderEntry};
use crate::timeline::{self, GroupLayout, Item};
use crate::value;

#[derive(Debug, Clone)]
pub struct AnnotatorLayout {
    pub name: String,
    pub layout: GroupLayout,
}

/// One chunk of the comparison view: the covered text plus one
/// timeline per annotator.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub text: String,
    pub annotators: Vec<AnnotatorLayout>,
}

fn entry_item(doc: &Document, entry: &OrderEntry) -> Item {
    Item {
        id: entry.span.start,
        label: LabelType::from_code(entry.label),
        time_raw: entry.time.clone(),
        numbers: value::extract_numbers(&entry.time),
        factuality: entry.factuality.clone(),
        fact_numbers: value::extract_numbers(&entry.factuality),
        relative_raw: entry.branch.clone(),
        text: doc.covered_text(entry.span),
        from_factuality: false,
    }
}

/// Compute the per-chunk comparison layouts for the active document.
pub fn chunk_layouts(doc: &Document) -> Vec<ChunkLayout> {
    let (a1, a2) = match (&doc.record.a1, &doc.record.a2) {
        (Some(a1), Some(a2)) => (a1, a2),
        _ => return Vec::new(),
    };
    let names = match &doc.record.annotators {
        Some(names) if names.len() >= 2 => [names[0].clone(), names[1].clone()],
        _ => ["a1".to_string(), "a2".to_string()],
    };

    let chunks1 = ordered(a1);
    let chunks2 = ordered(a2);
    if chunks1.len() != chunks2.len() {
        warn!(
            a1 = chunks1.len(),
            a2 = chunks2.len(),
            "mismatched adjudication chunk counts; rendering the shorter prefix"
        );
    }

    let mut layouts = Vec::new();
    for (chunk1, chunk2) in chunks1.iter().zip(chunks2.iter()) {
        let mut span_min = usize::MAX;
        let mut span_max = 0usize;
        let mut annotators = Vec::new();
        for (name, chunk) in names.iter().zip([chunk1, chunk2]) {
            let entries = ordered(chunk);
            for entry in &entries {
                span_min = span_min.min(entry.span.start);
                span_max = span_max.max(entry.span.end);
            }
            let items: Vec<Item> = entries.iter().map(|e| entry_item(doc, e)).collect();
            annotators.push(AnnotatorLayout {
                name: name.clone(),
                layout: timeline::layout_group(&items),
            });
        }
        let text = if span_min == usize::MAX {
            String::new()
        } else {
            doc.covered_text(crate::model::TokenSpan::new(span_min, span_max))
        };
        layouts.push(ChunkLayout { text, annotators });
    }
    layouts
}

/// One annotator's chunk with an integer offset applied to every time
/// value, ready to be placed into the live registry.
pub fn offset_chunk(chunk: &BTreeMap<String, OrderEntry>, offset: f64) -> Vec<OrderEntry> {
    ordered(chunk)
        .into_iter()
        .map(|entry| {
            let mut shifted = entry.clone();
            shifted.time = value::offset_time(&entry.time, LabelType::from_code(entry.label), offset);
            shifted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TokenSpan;
    use crate::record::Record;

    fn order_entry(start: usize, end: usize, label: u8, time: &str) -> OrderEntry {
        OrderEntry {
            span: TokenSpan::new(start, end),
            label,
            time: time.to_string(),
            branch: String::new(),
            factuality: String::new(),
        }
    }

    fn adjudication_doc() -> Document {
        let mut record = Record::new("the dam broke and the valley flooded overnight");
        let chunk = |entries: Vec<(usize, OrderEntry)>| {
            entries
                .into_iter()
                .map(|(i, e)| (i.to_string(), e))
                .collect::<BTreeMap<_, _>>()
        };
        let a1 = [(
            "0".to_string(),
            chunk(vec![
                (0, order_entry(1, 2, 0, "1")),
                (1, order_entry(5, 6, 0, "2")),
            ]),
        )]
        .into_iter()
        .collect();
        let a2 = [(
            "0".to_string(),
            chunk(vec![(0, order_entry(1, 2, 0, "3"))]),
        )]
        .into_iter()
        .collect();
        record.a1 = Some(a1);
        record.a2 = Some(a2);
        record.annotators = Some(vec!["ann1".to_string(), "ann2".to_string()]);
        Document::new(record)
    }

    #[test]
    fn test_chunk_layouts() {
        let doc = adjudication_doc();
        let layouts = chunk_layouts(&doc);
        assert_eq!(layouts.len(), 1);
        let chunk = &layouts[0];
        assert_eq!(chunk.annotators[0].name, "ann1");
        assert_eq!(chunk.annotators[0].layout.elements.len(), 2);
        assert_eq!(chunk.annotators[1].layout.elements.len(), 1);
        // Chunk text spans the extremes across both annotators.
        assert_eq!(chunk.text, "dam broke and the valley flooded");
    }

    #[test]
    fn test_mismatched_chunk_counts_use_shorter_prefix() {
        let mut doc = adjudication_doc();
        if let Some(a2) = doc.record.a2.as_mut() {
            a2.insert(
                "1".to_string(),
                [("0".to_string(), order_entry(7, 7, 0, "1"))]
                    .into_iter()
                    .collect(),
            );
        }
        // a1 has one chunk, a2 now has two; only the shared prefix renders.
        assert_eq!(chunk_layouts(&doc).len(), 1);
    }

    #[test]
    fn test_missing_annotator_data_yields_nothing() {
        let mut doc = adjudication_doc();
        doc.record.a2 = None;
        assert!(chunk_layouts(&doc).is_empty());
    }

    #[test]
    fn test_offset_chunk() {
        let chunk: BTreeMap<String, OrderEntry> = [
            ("0".to_string(), order_entry(1, 2, 0, "1:2")),
            ("1".to_string(), order_entry(4, 4, 7, "5")),
        ]
        .into_iter()
        .collect();
        let shifted = offset_chunk(&chunk, 10.0);
        assert_eq!(shifted[0].time, "11:12");
        // Irrealis resets to its placeholder regardless of offset.
        assert_eq!(shifted[1].time, ":");
    }
}
