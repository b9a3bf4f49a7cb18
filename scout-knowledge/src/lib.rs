#![deny(missing_docs)]
//! Knowledge store schema, write-through sinks, and the hybrid search
//! pipeline.

mod client;
mod schema;
mod search;
mod sink;

pub use client::KnowledgeClient;
pub use schema::{default_schema, missing_properties, CollectionDef, PropertyDataType, PropertyDef};
pub use search::{build_collection_filter, search, SearchFilters, SearchResult};
pub use sink::KnowledgeSink;
