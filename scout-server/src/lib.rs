#![deny(missing_docs)]
//! The composition root: assembles every singleton, builds the tool
//! catalog, and mounts it as an MCP service over stdio.

mod cli;
mod config_file;
mod handler;

pub use cli::Cli;
pub use config_file::load_config;
pub use handler::ScoutServer;
