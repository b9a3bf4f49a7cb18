//! Command-line flags. Not a spec feature — ambient CLI ergonomics every
//! `clap`-based binary in the ecosystem carries.

use std::path::PathBuf;

use clap::Parser;

/// Scout research MCP server.
#[derive(Debug, Parser)]
#[command(name = "scout-server", version, about)]
pub struct Cli {
    /// Optional TOML file of configuration overrides, merged under
    /// environment variables (an env var always wins over the file).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
