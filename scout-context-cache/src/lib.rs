#![deny(missing_docs)]
//! Persistent registry mapping `(content_id, model)` to a backend-side
//! reusable generative context cache, with idempotent prewarming.

mod registry;

pub use registry::{CacheLookup, CacheState, ContextCacheRegistry};
