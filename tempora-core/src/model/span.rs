use serde::{Deserialize, Serialize};

/// A closed interval of token indices marking one annotated entity.
///
/// Serializes as a two-element array, matching the persisted record
/// format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "[usize; 2]", from = "[usize; 2]")]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx <= self.end
    }

    /// Closed intervals intersect when neither lies wholly before the
    /// other.
    pub fn intersects(&self, other: &TokenSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl From<TokenSpan> for [usize; 2] {
    fn from(span: TokenSpan) -> Self {
        [span.start, span.end]
    }
}

impl From<[usize; 2]> for TokenSpan {
    fn from(pair: [usize; 2]) -> Self {
        TokenSpan::new(pair[0], pair[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = TokenSpan::new(2, 5);
        assert!(a.intersects(&TokenSpan::new(5, 8)));
        assert!(a.intersects(&TokenSpan::new(0, 2)));
        assert!(a.intersects(&TokenSpan::new(3, 4)));
        assert!(!a.intersects(&TokenSpan::new(6, 9)));
        assert!(!a.intersects(&TokenSpan::new(0, 1)));
    }

    #[test]
    fn test_serde_pair_form() {
        let span = TokenSpan::new(3, 7);
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, "[3,7]");
        let back: TokenSpan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }
}
