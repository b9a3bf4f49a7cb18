//! Collection schema definitions and idempotent evolution.

use serde::{Deserialize, Serialize};

/// The data type of a collection property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyDataType {
    /// A single text value.
    Text,
    /// A list of text values.
    TextList,
    /// An integer.
    Int,
    /// A floating-point number.
    Number,
    /// A date.
    Date,
    /// A boolean.
    Boolean,
}

/// A single collection property and its indexing flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// Data type.
    pub data_type: PropertyDataType,
    /// Whether this property contributes to the vector embedding.
    pub vectorize: bool,
    /// Whether equality/inclusion filters may target this property.
    pub filterable: bool,
    /// Whether range filters (`date_from`/`date_to`, numeric ranges) may target it.
    pub range_filterable: bool,
    /// Whether this property is covered by the keyword (BM25) index.
    pub searchable: bool,
}

impl PropertyDef {
    /// A plain, vectorized, searchable text property — the common case for
    /// a collection's primary content field.
    pub fn text(name: &str) -> Self {
        PropertyDef {
            name: name.to_string(),
            data_type: PropertyDataType::Text,
            vectorize: true,
            filterable: false,
            range_filterable: false,
            searchable: true,
        }
    }

    /// A filterable-only text property (tags, ids).
    pub fn filterable_text(name: &str) -> Self {
        PropertyDef {
            name: name.to_string(),
            data_type: PropertyDataType::Text,
            vectorize: false,
            filterable: true,
            range_filterable: false,
            searchable: false,
        }
    }
}

/// A knowledge collection: a name plus its property schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDef {
    /// Collection name.
    pub name: String,
    /// Properties, including the two common ones every collection carries.
    pub properties: Vec<PropertyDef>,
    /// The property the reranker targets for this collection.
    pub rerank_property: String,
}

fn common_properties() -> Vec<PropertyDef> {
    vec![
        PropertyDef {
            name: "created_at".to_string(),
            data_type: PropertyDataType::Date,
            vectorize: false,
            filterable: false,
            range_filterable: true,
            searchable: false,
        },
        PropertyDef {
            name: "source_tool".to_string(),
            data_type: PropertyDataType::Text,
            vectorize: false,
            filterable: true,
            range_filterable: false,
            searchable: false,
        },
    ]
}

fn collection(name: &str, rerank_property: &str, own_properties: Vec<PropertyDef>) -> CollectionDef {
    let mut properties = own_properties;
    properties.extend(common_properties());
    CollectionDef { name: name.to_string(), properties, rerank_property: rerank_property.to_string() }
}

/// The full, fixed set of knowledge collections, per §4.8's writer→collection map.
pub fn default_schema() -> Vec<CollectionDef> {
    vec![
        collection(
            "VideoAnalyses",
            "summary",
            vec![PropertyDef::text("summary"), PropertyDef::filterable_text("video_id")],
        ),
        collection(
            "SessionTranscripts",
            "turn_response",
            vec![PropertyDef::text("turn_response"), PropertyDef::filterable_text("session_id")],
        ),
        collection(
            "VideoMetadata",
            "description",
            vec![PropertyDef::text("description"), PropertyDef::filterable_text("video_id")],
        ),
        collection(
            "ResearchFindings",
            "claim",
            vec![
                PropertyDef::text("claim"),
                PropertyDef::filterable_text("report_uuid"),
                PropertyDef {
                    name: "evidence_tier".to_string(),
                    data_type: PropertyDataType::Text,
                    vectorize: false,
                    filterable: true,
                    range_filterable: false,
                    searchable: false,
                },
            ],
        ),
        collection("ResearchPlans", "topic", vec![PropertyDef::text("topic")]),
        collection(
            "ContentAnalyses",
            "summary",
            vec![PropertyDef::text("summary"), PropertyDef::filterable_text("content_id")],
        ),
        collection("WebSearchResults", "response", vec![PropertyDef::text("response")]),
    ]
}

/// Compute which properties in `wanted` are missing from `existing`, by name.
///
/// Collection evolution only ever appends: existing properties are never
/// removed or retyped, regardless of what `wanted` says about them.
pub fn missing_properties(existing: &[PropertyDef], wanted: &[PropertyDef]) -> Vec<PropertyDef> {
    wanted.iter().filter(|p| !existing.iter().any(|e| e.name == p.name)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_collection_carries_common_properties() {
        for collection in default_schema() {
            assert!(collection.properties.iter().any(|p| p.name == "created_at"));
            assert!(collection.properties.iter().any(|p| p.name == "source_tool"));
        }
    }

    #[test]
    fn missing_properties_only_returns_new_ones() {
        let existing = vec![PropertyDef::text("summary")];
        let wanted = vec![PropertyDef::text("summary"), PropertyDef::filterable_text("video_id")];
        let missing = missing_properties(&existing, &wanted);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "video_id");
    }

    #[test]
    fn rerank_property_is_set_per_collection() {
        let schema = default_schema();
        let research = schema.iter().find(|c| c.name == "ResearchFindings").unwrap();
        assert_eq!(research.rerank_property, "claim");
    }
}
