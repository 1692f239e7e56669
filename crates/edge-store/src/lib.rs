//! # Edge Store - Document Store Port
//!
//! The edge fabric treats persistence as an external collaborator. This crate
//! defines the driven port the rest of the workspace consumes and ships an
//! in-memory adapter for development and tests.
//!
//! ```text
//!   gateway repositories ──→ DocumentStore (port) ──→ InMemoryDocumentStore
//!   periodic publisher   ──┘                       └─→ (any document DB)
//! ```
//!
//! Documents are JSON objects. Queries are a small, typed subset of what a
//! document database offers: equality filters, `$set`/`$inc` style patches,
//! sorted/limited finds and single-group aggregation pipelines.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod memory;
pub mod ports;
pub mod query;

pub use error::StoreError;
pub use memory::InMemoryDocumentStore;
pub use ports::{from_document, to_document, DocumentStore};
pub use query::{
    Accumulator, Document, Filter, FindOptions, Group, Patch, Pipeline, SortOrder, Stage,
};
