use thiserror::Error;

/// Errors surfaced by the core. Span rejections are recoverable: the
/// workspace drops the offending selection and carries on. A malformed
/// import line is fatal to the whole load.
#[derive(Debug, Error)]
pub enum Error {
    #[error("span [{start}, {end}] is inverted")]
    InvertedSpan { start: usize, end: usize },

    #[error("span [{start}, {end}] overlaps an existing mark")]
    OverlappingSpan { start: usize, end: usize },

    #[error("line {line}: malformed record: {source}")]
    MalformedRecord {
        line: usize,
        source: serde_json::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no document is active")]
    NoActiveDocument,

    #[error("no entry with id {0}")]
    UnknownEntry(usize),

    #[error("document index {0} is out of range")]
    BadDocumentIndex(usize),
}

impl Error {
    /// Span rejections are expected during normal annotation and are
    /// reported to the user as a discarded selection, not a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvertedSpan { .. } | Error::OverlappingSpan { .. }
        )
    }
}
