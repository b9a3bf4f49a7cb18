#![deny(missing_docs)]
//! Process-wide configuration: env resolution, runtime patching, and secret
//! redaction for the scout research MCP server.

mod config;
mod handle;
mod presets;
mod redacted;

pub use config::Config;
pub use handle::{ConfigHandle, ConfigOverrides};
pub use presets::ModelPreset;
pub use redacted::Redacted;
