//! A string wrapper whose `Debug` never leaks its contents.
//!
//! Mirrors `neuron-secret::SecretValue`'s redacted `Debug` impl: the value is
//! still plain `String` underneath (config secrets are short-lived API keys,
//! not the zeroize-on-drop material `neuron-secret` guards), but nothing
//! printing a [`Config`](crate::Config) for diagnostics can accidentally leak one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A string that displays as `[REDACTED]` in `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Redacted(String);

impl Redacted {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret. Callers should use this only at the
    /// point the secret is sent over the wire (an `Authorization` header, …).
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True if no secret was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "[REDACTED]")
        }
    }
}

impl Default for Redacted {
    fn default() -> Self {
        Self(String::new())
    }
}

impl From<String> for Redacted {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_nonempty_secret() {
        let secret = Redacted::new("sk-abc123");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn debug_shows_empty_string_plainly() {
        let secret = Redacted::default();
        assert_eq!(format!("{:?}", secret), "\"\"");
    }

    #[test]
    fn expose_returns_inner_value() {
        let secret = Redacted::new("sk-abc123");
        assert_eq!(secret.expose(), "sk-abc123");
    }
}
