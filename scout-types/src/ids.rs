//! Typed identifier wrappers.
//!
//! Plain `String` newtypes with no format enforcement — callers choose how
//! identifiers look; these exist only to stop a `ContentId` being passed
//! where a `SessionId` belongs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap anything string-like as this identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(ContentId, "Hashable identity of a remote video id or local file content hash.");
typed_id!(SessionId, "Opaque short identifier for a video session.");
typed_id!(ReportUuid, "Identifier of a research report, shared by its findings.");
