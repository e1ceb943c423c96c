//! Registry of annotated spans for one document.
//!
//! Owns every event and time-expression span of the active document,
//! keeps entries ordered by start token, enforces the non-overlap
//! invariant, and maintains the auto-label counters that seed default
//! ordinal values for new entries.

use std::collections::{BTreeMap, HashMap};

use crate::error::Error;
use crate::model::{AnnotationEntry, LabelType, SpanCategory, TokenSpan};
use crate::value;

#[derive(Debug, Clone, Default)]
pub struct SpanRegistry {
    entries: BTreeMap<usize, AnnotationEntry>,
    timex: BTreeMap<usize, TokenSpan>,
    /// Primary ordinal counter: the next default position offered for a
    /// bounded (begin/continuation) entry on the main timeline.
    tml_count: i64,
    /// Per-branch ordinal counters for directional placements.
    alt_counts: HashMap<String, i64>,
    /// Id of the entry that last advanced the primary counter; deleting
    /// it rolls the counter back.
    last_counted_id: Option<usize>,
}

impl SpanRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            timex: BTreeMap::new(),
            tml_count: 1,
            alt_counts: HashMap::new(),
            last_counted_id: None,
        }
    }

    /// Validate a selection against the registry.
    ///
    /// Rejects inverted intervals and anything intersecting an existing
    /// span of either category. If a covered token embeds a paragraph
    /// break the end is pushed out by one token: the break occupies an
    /// extra rendered node without consuming an annotatable token.
    pub fn propose_span(
        &self,
        start: usize,
        end: usize,
        tokens: &[&str],
    ) -> Result<TokenSpan, Error> {
        if start > end {
            return Err(Error::InvertedSpan { start, end });
        }
        let mut end = end;
        if !tokens.is_empty() {
            let bounded = start..=end.min(tokens.len() - 1);
            if bounded.into_iter().any(|i| tokens[i].contains('\n')) {
                end = (end + 1).min(tokens.len() - 1);
            }
        }
        let span = TokenSpan::new(start, end);
        let clash = self
            .entries
            .values()
            .any(|e| e.span.intersects(&span))
            || self.timex.values().any(|t| t.intersects(&span));
        if clash {
            return Err(Error::OverlappingSpan { start, end });
        }
        Ok(span)
    }

    /// Insert a pre-populated entry, keyed by its span start.
    pub fn insert_entry(&mut self, entry: AnnotationEntry) -> usize {
        let id = entry.id;
        self.entries.insert(id, entry);
        id
    }

    /// Place a fresh annotation the way the annotate gesture does,
    /// seeding the time/branch fields from the counters.
    ///
    /// A directional label is stored as `Begin` with an auto-generated
    /// branch key relating it to the previous main-timeline position;
    /// its ordinal comes from the per-branch counter.
    pub fn place(&mut self, span: TokenSpan, requested: LabelType) -> usize {
        let mut entry = AnnotationEntry::new(span, requested);
        match requested {
            LabelType::RelativeAfter | LabelType::RelativeBefore => {
                let anchor = self.tml_count - 1;
                let key = if requested == LabelType::RelativeAfter {
                    format!("{}>", anchor)
                } else {
                    format!("<{}", anchor)
                };
                let ordinal = self.alt_counts.entry(key.clone()).or_insert(1);
                entry.time = ordinal.to_string();
                *ordinal += 1;
                entry.relative = key;
                entry.label = LabelType::Begin;
            }
            LabelType::UnboundedBoth | LabelType::UnboundedRight | LabelType::UnboundedLeft => {
                let seed = if self.tml_count == 1 {
                    1
                } else {
                    self.tml_count - 1
                };
                entry.time = seed.to_string();
            }
            LabelType::Irrealis => {
                entry.time = ":".to_string();
            }
            LabelType::Begin | LabelType::Continuation => {
                entry.time = self.tml_count.to_string();
                self.tml_count += 1;
                self.last_counted_id = Some(entry.id);
            }
        }
        self.insert_entry(entry)
    }

    /// Insert an entry materialized from a persisted record. A bounded
    /// main-timeline entry with no time value yet gets the primary
    /// counter default, same as a fresh placement.
    pub fn insert_loaded(&mut self, mut entry: AnnotationEntry) -> usize {
        if entry.time.is_empty()
            && entry.relative.is_empty()
            && matches!(entry.label, LabelType::Begin | LabelType::Continuation)
        {
            entry.time = self.tml_count.to_string();
            self.tml_count += 1;
            self.last_counted_id = Some(entry.id);
        }
        self.insert_entry(entry)
    }

    pub fn insert_timex(&mut self, span: TokenSpan) {
        self.timex.insert(span.start, span);
    }

    /// Remove an entry, restoring its tokens to plain text. Rolls the
    /// primary counter back when the removed entry was the one that
    /// last advanced it.
    pub fn remove_entry(&mut self, id: usize) -> Option<AnnotationEntry> {
        let removed = self.entries.remove(&id)?;
        if self.last_counted_id == Some(id) {
            self.tml_count -= 1;
            self.last_counted_id = None;
        }
        Some(removed)
    }

    pub fn remove_timex(&mut self, id: usize) -> Option<TokenSpan> {
        self.timex.remove(&id)
    }

    /// Advance an entry's label along the cycle table.
    pub fn cycle_label(&mut self, id: usize) -> Result<LabelType, Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        entry.label = entry.label.next();
        Ok(entry.label)
    }

    /// Record a user edit of the time field and resynchronize the
    /// matching counter to `typed value + 1`.
    pub fn set_time(&mut self, id: usize, raw: &str) -> Result<(), Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        entry.time = value::normalize_time(raw, entry.label);
        if let Some(n) = value::extract_numbers(raw).first() {
            let typed = *n as i64;
            if entry.relative.is_empty() {
                self.tml_count = typed + 1;
            } else {
                self.alt_counts.insert(entry.relative.clone(), typed + 1);
            }
        }
        Ok(())
    }

    pub fn set_relative(&mut self, id: usize, raw: &str) -> Result<(), Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        entry.relative = value::normalize_relative(raw);
        Ok(())
    }

    pub fn set_factuality(&mut self, id: usize, raw: &str) -> Result<(), Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        entry.factuality = value::normalize_factuality(raw);
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&AnnotationEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut AnnotationEntry> {
        self.entries.get_mut(&id)
    }

    /// Entries in token order.
    pub fn entries(&self) -> impl Iterator<Item = &AnnotationEntry> {
        self.entries.values()
    }

    pub fn timex_spans(&self) -> impl Iterator<Item = &TokenSpan> {
        self.timex.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.timex.is_empty()
    }

    /// Category and id of the span covering a token, if any.
    pub fn span_at(&self, idx: usize) -> Option<(SpanCategory, usize)> {
        if let Some(e) = self.entries.values().find(|e| e.span.contains(idx)) {
            return Some((SpanCategory::Event, e.id));
        }
        self.timex
            .values()
            .find(|t| t.contains(idx))
            .map(|t| (SpanCategory::Timex, t.start))
    }

    /// Wipe everything and reset both counters (bulk-clear path, no
    /// per-entry confirmation).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.timex.clear();
        self.tml_count = 1;
        self.alt_counts.clear();
        self.last_counted_id = None;
    }

    pub fn tml_count(&self) -> i64 {
        self.tml_count
    }

    pub fn alt_count(&self, key: &str) -> Option<i64> {
        self.alt_counts.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<&'static str> {
        "the storm hit the coast before dawn".split(' ').collect()
    }

    #[test]
    fn test_propose_rejects_inverted() {
        let reg = SpanRegistry::new();
        assert!(matches!(
            reg.propose_span(4, 2, &tokens()),
            Err(Error::InvertedSpan { .. })
        ));
    }

    #[test]
    fn test_non_overlap_invariant() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        let span = reg.propose_span(1, 2, &toks).unwrap();
        reg.place(span, LabelType::Begin);

        // Every intersecting proposal is rejected, regardless of category.
        assert!(reg.propose_span(2, 4, &toks).is_err());
        assert!(reg.propose_span(0, 1, &toks).is_err());
        assert!(reg.propose_span(1, 1, &toks).is_err());
        // Disjoint proposals still pass.
        let span = reg.propose_span(4, 5, &toks).unwrap();
        reg.insert_timex(span);
        assert!(reg.propose_span(5, 6, &toks).is_err());
        assert!(reg.propose_span(6, 6, &toks).is_ok());

        // Accepted spans never intersect pairwise.
        let spans: Vec<_> = reg
            .entries()
            .map(|e| e.span)
            .chain(reg.timex_spans().copied())
            .collect();
        for (i, a) in spans.iter().enumerate() {
            for b in &spans[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_paragraph_break_extends_end() {
        let toks: Vec<&str> = "one two\nthree four five".split(' ').collect();
        let reg = SpanRegistry::new();
        let span = reg.propose_span(1, 1, &toks).unwrap();
        assert_eq!(span, TokenSpan::new(1, 2));
        // No break inside the selection: untouched.
        let span = reg.propose_span(3, 3, &toks).unwrap();
        assert_eq!(span, TokenSpan::new(3, 3));
    }

    #[test]
    fn test_primary_counter_seeds_and_rolls_back() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        let id1 = reg.place(reg.propose_span(0, 0, &toks).unwrap(), LabelType::Begin);
        assert_eq!(reg.get(id1).unwrap().time, "1");
        let id2 = reg.place(reg.propose_span(2, 2, &toks).unwrap(), LabelType::Begin);
        assert_eq!(reg.get(id2).unwrap().time, "2");
        assert_eq!(reg.tml_count(), 3);

        // Deleting the last-counted entry rolls the counter back once.
        reg.remove_entry(id2);
        assert_eq!(reg.tml_count(), 2);
        reg.remove_entry(id1);
        assert_eq!(reg.tml_count(), 2);
    }

    #[test]
    fn test_directional_placement_generates_branch() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        reg.place(reg.propose_span(0, 0, &toks).unwrap(), LabelType::Begin);
        reg.place(reg.propose_span(1, 1, &toks).unwrap(), LabelType::Begin);

        let id = reg.place(
            reg.propose_span(3, 3, &toks).unwrap(),
            LabelType::RelativeAfter,
        );
        let entry = reg.get(id).unwrap();
        // Stored as Begin, anchored after the last placed position.
        assert_eq!(entry.label, LabelType::Begin);
        assert_eq!(entry.relative, "2>");
        assert_eq!(entry.time, "1");

        let id = reg.place(
            reg.propose_span(5, 5, &toks).unwrap(),
            LabelType::RelativeAfter,
        );
        assert_eq!(reg.get(id).unwrap().time, "2");
        assert_eq!(reg.alt_count("2>"), Some(3));

        let id = reg.place(
            reg.propose_span(6, 6, &toks).unwrap(),
            LabelType::RelativeBefore,
        );
        assert_eq!(reg.get(id).unwrap().relative, "<2");
    }

    #[test]
    fn test_time_edit_resyncs_counter() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        let id = reg.place(reg.propose_span(0, 0, &toks).unwrap(), LabelType::Begin);
        reg.set_time(id, "7").unwrap();
        assert_eq!(reg.tml_count(), 8);
        assert_eq!(reg.get(id).unwrap().time, "7");

        // Branch-scoped entries resync the branch counter instead.
        let id = reg.place(
            reg.propose_span(2, 2, &toks).unwrap(),
            LabelType::RelativeAfter,
        );
        reg.set_time(id, "4").unwrap();
        assert_eq!(reg.alt_count("7>"), Some(5));
        assert_eq!(reg.tml_count(), 8);
    }

    #[test]
    fn test_unbounded_and_irrealis_seeds() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        let id = reg.place(
            reg.propose_span(0, 0, &toks).unwrap(),
            LabelType::UnboundedBoth,
        );
        assert_eq!(reg.get(id).unwrap().time, "1");
        let id = reg.place(reg.propose_span(2, 2, &toks).unwrap(), LabelType::Irrealis);
        assert_eq!(reg.get(id).unwrap().time, ":");
        // Unbounded and irrealis placements never advance the counter.
        assert_eq!(reg.tml_count(), 1);
    }

    #[test]
    fn test_clear_resets_counters() {
        let toks = tokens();
        let mut reg = SpanRegistry::new();
        reg.place(reg.propose_span(0, 1, &toks).unwrap(), LabelType::Begin);
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.tml_count(), 1);
    }
}
