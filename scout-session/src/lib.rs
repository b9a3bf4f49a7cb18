#![deny(missing_docs)]
//! Video/content session store: bounded in-memory history with optional
//! durable persistence to a single SQLite database.

mod durable;
mod session;
mod store;

pub use durable::{DurableSessionStore, SqliteSessionStore};
pub use session::Session;
pub use store::{SessionStore, SessionStoreConfig};
