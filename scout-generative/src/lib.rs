#![deny(missing_docs)]
//! Process-wide generative-backend client: unified text/structured
//! generation, retried, with thinking-part stripping and JSON Schema
//! validation of structured output.

mod client;
mod error;
mod pool;
mod types;
mod upload;

pub use client::GenerativeClient;
pub use error::{map_http_status, map_reqwest_error};
pub use pool::GenerativeClientPool;
pub use types::{
    extract_visible_text, GenerativeRequest, GenerativeResponse, GenerativeUsage, RequestBlock, RequestContent,
    RequestMessage, ResponseBlock,
};
