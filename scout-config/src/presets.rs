//! Named `(default_model, flash_model)` pairs a caller can select by name
//! instead of spelling out both model identifiers.

use serde::{Deserialize, Serialize};

/// A named model preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPreset {
    /// The strongest available pair.
    Best,
    /// A pair with the slowest-moving, most battle-tested identifiers.
    Stable,
    /// The cheapest pair that still supports every tool.
    Budget,
}

impl ModelPreset {
    /// Resolve this preset to its `(default_model, flash_model)` identifiers.
    pub fn models(&self) -> (&'static str, &'static str) {
        match self {
            ModelPreset::Best => ("scout-pro-2", "scout-flash-2"),
            ModelPreset::Stable => ("scout-pro-1", "scout-flash-1"),
            ModelPreset::Budget => ("scout-flash-2", "scout-flash-lite-2"),
        }
    }

    /// Parse a preset name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "best" => Some(ModelPreset::Best),
            "stable" => Some(ModelPreset::Stable),
            "budget" => Some(ModelPreset::Budget),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ModelPreset::parse("BEST"), Some(ModelPreset::Best));
        assert_eq!(ModelPreset::parse("budget"), Some(ModelPreset::Budget));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(ModelPreset::parse("fastest"), None);
    }

    #[test]
    fn each_preset_resolves_to_a_distinct_pair() {
        let (d, f) = ModelPreset::Stable.models();
        assert_ne!(d, f);
    }
}
