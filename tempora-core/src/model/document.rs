use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::record::Record;

use super::TokenSpan;

/// A live document: one persisted record plus session bookkeeping.
#[derive(Debug, Clone)]
pub struct Document {
    /// Session-local handle, independent of the record's optional `id`.
    pub id: Uuid,
    pub record: Record,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(record: Record) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            updated_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Tokenization is a plain split on single spaces; embedded
    /// newlines stay inside their token.
    pub fn tokens(&self) -> Vec<&str> {
        self.record.text.split(' ').collect()
    }

    pub fn token_count(&self) -> usize {
        self.tokens().len()
    }

    /// Text covered by a span, space-joined. Out-of-range indices are
    /// clamped.
    pub fn covered_text(&self, span: TokenSpan) -> String {
        let tokens = self.tokens();
        if tokens.is_empty() || span.start >= tokens.len() {
            return String::new();
        }
        let end = span.end.min(tokens.len() - 1);
        tokens[span.start..=end].join(" ")
    }

    /// Display name: the record's own id (blank when the corpus did
    /// not carry one).
    pub fn title(&self) -> String {
        match &self.record.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_split_on_single_spaces() {
        let doc = Document::new(Record::new("John left\nearly yesterday"));
        // "left\nearly" is a single token; the newline is not a split point.
        assert_eq!(doc.tokens(), vec!["John", "left\nearly", "yesterday"]);
    }

    #[test]
    fn test_covered_text() {
        let doc = Document::new(Record::new("a b c d"));
        assert_eq!(doc.covered_text(TokenSpan::new(1, 2)), "b c");
        assert_eq!(doc.covered_text(TokenSpan::new(2, 9)), "c d");
        assert_eq!(doc.covered_text(TokenSpan::new(9, 9)), "");
    }
}
