mod document;
mod entry;
mod label;
mod span;

pub use document::Document;
pub use entry::{AnnotationEntry, SpanCategory};
pub use label::LabelType;
pub use span::TokenSpan;
