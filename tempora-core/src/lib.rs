//! Tempora Core - Temporal annotation and timeline layout library
//!
//! This crate provides the data model and logic for the Tempora
//! annotation tool: token-span registration under a non-overlap
//! invariant, parsing of the free-text time/branch/factuality
//! mini-language, coreference and branch grouping, and the timeline
//! layout engine that turns annotations into bar/point descriptors
//! for a rendering surface.

pub mod adjudication;
pub mod error;
pub mod model;
pub mod record;
pub mod registry;
pub mod relations;
pub mod store;
pub mod timeline;
pub mod value;
pub mod workspace;

pub use error::Error;
pub use model::{AnnotationEntry, Document, LabelType, SpanCategory, TokenSpan};
pub use record::Record;
pub use registry::SpanRegistry;
pub use relations::RelationIndex;
pub use store::DocumentStore;
pub use timeline::{Element, ElementKind, GroupLayout, TimelineLayout};
pub use value::{Parsed, Value};
pub use workspace::{Field, InterfaceMode, Workspace};
