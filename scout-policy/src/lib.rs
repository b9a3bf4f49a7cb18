#![deny(missing_docs)]
//! Outbound URL policy (SSRF-style guards) and local filesystem access root
//! enforcement for the scout research MCP server.

mod download;
mod path_policy;
mod url_policy;

pub use download::{download_checked, MAX_REDIRECTS};
pub use path_policy::enforce_local_access_root;
pub use url_policy::{validate_url, validate_url_resolved, UrlPolicyConfig};
