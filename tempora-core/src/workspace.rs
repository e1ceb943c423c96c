//! The explicitly-owned workspace object: one interface mode, the
//! document collection, and the live registry for the active document.
//!
//! Every rendering-surface gesture lands here as a method call; the
//! pure parse/propose/layout functions below it never see the surface.

use tracing::debug;

use crate::adjudication::{self, ChunkLayout};
use crate::error::Error;
use crate::model::{AnnotationEntry, LabelType, SpanCategory, TokenSpan};
use crate::record;
use crate::registry::SpanRegistry;
use crate::relations::{self, RelationIndex};
use crate::store::{self, DocumentStore};
use crate::timeline::{self, Item, TimelineLayout};
use crate::value;

/// Which annotation schema is active. Switching discards all unsaved
/// state; the destructive confirmation happens on the rendering side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceMode {
    Coreference,
    EventOrder,
    Adjudication,
}

/// Editable fields of an entry, as reported by field-edit gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Time,
    Relative,
    Factuality,
}

/// Annotator slot in adjudication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotator {
    First,
    Second,
}

pub struct Workspace {
    mode: InterfaceMode,
    store: DocumentStore,
    registry: SpanRegistry,
    index: RelationIndex,
    pending_delete: Option<(SpanCategory, usize)>,
}

impl Workspace {
    pub fn new(mode: InterfaceMode) -> Self {
        Self {
            mode,
            store: DocumentStore::new(),
            registry: SpanRegistry::new(),
            index: RelationIndex::default(),
            pending_delete: None,
        }
    }

    pub fn mode(&self) -> InterfaceMode {
        self.mode
    }

    /// Switch schema, discarding every loaded document and edit.
    pub fn change_mode(&mut self, mode: InterfaceMode) {
        self.mode = mode;
        self.store = DocumentStore::new();
        self.registry.clear();
        self.index = RelationIndex::default();
        self.pending_delete = None;
    }

    /// Replace the corpus. No document is active until `switch_to`.
    pub fn load_corpus(&mut self, content: &str) -> Result<(), Error> {
        self.store = DocumentStore::load(content)?;
        self.registry.clear();
        self.index = RelationIndex::default();
        self.pending_delete = None;
        Ok(())
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn relation_index(&self) -> &RelationIndex {
        &self.index
    }

    /// Commit the live registry into the active record, then make
    /// another document active and materialize its entries.
    pub fn switch_to(&mut self, index: usize) -> Result<(), Error> {
        self.persist_active();
        self.store.set_current(index)?;
        self.load_active();
        Ok(())
    }

    pub fn next_document(&mut self) -> Result<(), Error> {
        let next = self.store.current().map(|i| i + 1).unwrap_or(0);
        self.switch_to(next)
    }

    pub fn prev_document(&mut self) -> Result<(), Error> {
        match self.store.current() {
            Some(i) if i > 0 => self.switch_to(i - 1),
            Some(i) => Err(Error::BadDocumentIndex(i)),
            None => Err(Error::NoActiveDocument),
        }
    }

    /// The canonical commit: re-derive the active record's category
    /// maps from the live registry. Idempotent.
    pub fn persist_active(&mut self) {
        if let Some(doc) = self.store.active_mut() {
            store::flush(doc, &self.registry, self.mode);
        }
    }

    /// Commit, then serialize the whole corpus (CRLF jsonl).
    pub fn export(&mut self) -> Result<String, Error> {
        self.persist_active();
        self.store.export()
    }

    fn load_active(&mut self) {
        self.registry.clear();
        self.pending_delete = None;
        let record = match self.store.active() {
            Some(doc) => doc.record.clone(),
            None => {
                self.index = RelationIndex::default();
                return;
            }
        };
        let tokens: Vec<&str> = record.text.split(' ').collect();

        match self.mode {
            InterfaceMode::Coreference => {
                let cluster_of = relations::invert_clusters(&record.event_coreference);
                for event in record::ordered(&record.events) {
                    let span = event.span();
                    let span = match self.registry.propose_span(span.start, span.end, &tokens) {
                        Ok(span) => span,
                        Err(e) => {
                            debug!(error = %e, "skipping stored event span");
                            continue;
                        }
                    };
                    let mut entry = AnnotationEntry::new(span, LabelType::Begin);
                    if let Some(key) = cluster_of.get(&entry.id) {
                        entry.relative = relations::normalize_coref(entry.id, &key.to_string());
                    }
                    self.registry.insert_entry(entry);
                }
                for timex in record::ordered(&record.timex) {
                    let span = timex.span();
                    if let Ok(span) = self.registry.propose_span(span.start, span.end, &tokens) {
                        self.registry.insert_timex(span);
                    }
                }
            }
            InterfaceMode::EventOrder | InterfaceMode::Adjudication => {
                for stored in record::ordered(&record.event_order) {
                    let span = stored.span;
                    let span = match self.registry.propose_span(span.start, span.end, &tokens) {
                        Ok(span) => span,
                        Err(e) => {
                            debug!(error = %e, "skipping stored order entry");
                            continue;
                        }
                    };
                    let label = LabelType::from_code(stored.label);
                    let mut entry = AnnotationEntry::new(span, label);
                    if !stored.time.is_empty() {
                        entry.time = value::normalize_time(&stored.time, label);
                    }
                    entry.relative = value::normalize_relative(&stored.branch);
                    entry.factuality = value::normalize_factuality(&stored.factuality);
                    self.registry.insert_loaded(entry);
                }
            }
        }

        // Hidden coreference members are recomputed whenever the record
        // carries an events map, and ride along on the record so they
        // survive export.
        if !record.events.is_empty() {
            let event_ids: Vec<usize> =
                record::ordered(&record.events).iter().map(|e| e.span().start).collect();
            let invisible = relations::invisible_events(&record.event_coreference, &event_ids);
            if let Some(doc) = self.store.active_mut() {
                doc.record.invisible_events = invisible;
            }
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        let clusters = match self.store.active() {
            Some(doc) => &doc.record.event_coreference,
            None => {
                self.index = RelationIndex::default();
                return;
            }
        };
        let entries: Vec<&AnnotationEntry> = self.registry.entries().collect();
        self.index = relations::compute(clusters, &entries);
    }

    /// Selection gesture: annotate an event span. The label argument is
    /// the currently selected label type; coreference mode always
    /// places plain marks.
    pub fn select_event(
        &mut self,
        start: usize,
        end: usize,
        label: LabelType,
    ) -> Result<usize, Error> {
        let doc = self.store.active().ok_or(Error::NoActiveDocument)?;
        let text = doc.record.text.clone();
        let tokens: Vec<&str> = text.split(' ').collect();
        let span = self.registry.propose_span(start, end, &tokens)?;
        let id = match self.mode {
            InterfaceMode::Coreference => self
                .registry
                .insert_entry(AnnotationEntry::new(span, LabelType::Begin)),
            _ => self.registry.place(span, label),
        };
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        self.rebuild_index();
        Ok(id)
    }

    /// Selection gesture: annotate a time expression (coreference mode).
    pub fn select_timex(&mut self, start: usize, end: usize) -> Result<TokenSpan, Error> {
        let doc = self.store.active().ok_or(Error::NoActiveDocument)?;
        let text = doc.record.text.clone();
        let tokens: Vec<&str> = text.split(' ').collect();
        let span = self.registry.propose_span(start, end, &tokens)?;
        self.registry.insert_timex(span);
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        Ok(span)
    }

    /// Field-edit gesture.
    pub fn edit_field(&mut self, id: usize, field: Field, raw: &str) -> Result<(), Error> {
        match field {
            Field::Time => self.registry.set_time(id, raw)?,
            Field::Relative => match self.mode {
                InterfaceMode::Coreference => {
                    let entry = self.registry.get_mut(id).ok_or(Error::UnknownEntry(id))?;
                    entry.relative = relations::normalize_coref(id, raw);
                }
                _ => self.registry.set_relative(id, raw)?,
            },
            Field::Factuality => self.registry.set_factuality(id, raw)?,
        }
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        self.rebuild_index();
        Ok(())
    }

    /// Label-cycle gesture.
    pub fn cycle_label(&mut self, id: usize) -> Result<LabelType, Error> {
        let label = self.registry.cycle_label(id)?;
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        Ok(label)
    }

    /// Click-on-mark gesture: stage a deletion pending confirmation.
    pub fn request_delete(&mut self, id: usize) -> Result<(), Error> {
        if self.registry.get(id).is_some() {
            self.pending_delete = Some((SpanCategory::Event, id));
            Ok(())
        } else if self.registry.timex_spans().any(|t| t.start == id) {
            self.pending_delete = Some((SpanCategory::Timex, id));
            Ok(())
        } else {
            Err(Error::UnknownEntry(id))
        }
    }

    pub fn pending_delete(&self) -> Option<(SpanCategory, usize)> {
        self.pending_delete
    }

    /// Resolve the staged deletion. Returns the removed id when
    /// confirmed.
    pub fn confirm_delete(&mut self, confirmed: bool) -> Option<usize> {
        let (category, id) = self.pending_delete.take()?;
        if !confirmed {
            return None;
        }
        match category {
            SpanCategory::Event => {
                self.registry.remove_entry(id);
            }
            SpanCategory::Timex => {
                self.registry.remove_timex(id);
            }
        }
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        self.rebuild_index();
        Some(id)
    }

    /// Bulk clear: every mark goes without individual confirmation and
    /// the counters reset.
    pub fn clear_active(&mut self) {
        self.registry.clear();
        self.pending_delete = None;
        self.rebuild_index();
    }

    pub fn entry(&self, id: usize) -> Option<&AnnotationEntry> {
        self.registry.get(id)
    }

    /// All live entries in token order.
    pub fn entries(&self) -> Vec<&AnnotationEntry> {
        self.registry.entries().collect()
    }

    /// Entries minus hidden coreference members; what the base view
    /// actually marks up.
    pub fn visible_entries(&self) -> Vec<&AnnotationEntry> {
        self.registry
            .entries()
            .filter(|e| !self.index.is_hidden(e.id))
            .collect()
    }

    pub fn registry(&self) -> &SpanRegistry {
        &self.registry
    }

    /// Recompute the timeline for the active document. Coreference
    /// mode has no timeline.
    pub fn layout(&self) -> Option<TimelineLayout> {
        if self.mode == InterfaceMode::Coreference {
            return None;
        }
        let doc = self.store.active()?;
        let items: Vec<Item> = self
            .registry
            .entries()
            .map(|entry| Item::from_entry(entry, doc.covered_text(entry.span)))
            .collect();
        Some(timeline::layout_timeline(&items, &self.index))
    }

    /// Per-chunk dual-annotator layouts (adjudication mode).
    pub fn adjudication_layouts(&self) -> Vec<ChunkLayout> {
        if self.mode != InterfaceMode::Adjudication {
            return Vec::new();
        }
        match self.store.active() {
            Some(doc) => adjudication::chunk_layouts(doc),
            None => Vec::new(),
        }
    }

    /// Copy one annotator's chunk into the live registry with an
    /// integer offset applied to its time values. Overlapping spans are
    /// skipped, same as any other rejected proposal. Returns how many
    /// entries were placed.
    pub fn apply_adjudication_offset(
        &mut self,
        annotator: Annotator,
        chunk_key: &str,
        offset: f64,
    ) -> Result<usize, Error> {
        let doc = self.store.active().ok_or(Error::NoActiveDocument)?;
        let chunks = match annotator {
            Annotator::First => doc.record.a1.as_ref(),
            Annotator::Second => doc.record.a2.as_ref(),
        };
        let chunk = chunks
            .and_then(|c| c.get(chunk_key))
            .cloned()
            .unwrap_or_default();
        let text = doc.record.text.clone();
        let tokens: Vec<&str> = text.split(' ').collect();

        let mut placed = 0;
        for stored in adjudication::offset_chunk(&chunk, offset) {
            let span = match self
                .registry
                .propose_span(stored.span.start, stored.span.end, &tokens)
            {
                Ok(span) => span,
                Err(_) => continue,
            };
            let label = LabelType::from_code(stored.label);
            let mut entry = AnnotationEntry::new(span, label);
            entry.time = stored.time.clone();
            entry.relative = value::normalize_relative(&stored.branch);
            entry.factuality = value::normalize_factuality(&stored.factuality);
            self.registry.insert_entry(entry);
            placed += 1;
        }
        if let Some(doc) = self.store.active_mut() {
            doc.touch();
        }
        self.rebuild_index();
        Ok(placed)
    }
}
