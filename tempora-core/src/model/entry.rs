use super::{LabelType, TokenSpan};

/// Which mark category a span belongs to. Spans of either category may
/// not overlap each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanCategory {
    Event,
    Timex,
}

/// One annotated span plus its editable fields.
///
/// The entry id is the span's start token index; since accepted spans
/// never overlap, it is unique within the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEntry {
    pub id: usize,
    pub span: TokenSpan,
    pub label: LabelType,
    /// Raw temporal value, normalized to the canonical mini-language
    /// form after every edit.
    pub time: String,
    /// Branch / related-to value in order mode, coreference target id
    /// in coreference mode. Doubles as the nested-timeline group key.
    pub relative: String,
    /// Factuality marker, constrained to a small vocabulary plus an
    /// optional numeric qualifier.
    pub factuality: String,
}

impl AnnotationEntry {
    pub fn new(span: TokenSpan, label: LabelType) -> Self {
        Self {
            id: span.start,
            span,
            label,
            time: String::new(),
            relative: String::new(),
            factuality: String::new(),
        }
    }
}
