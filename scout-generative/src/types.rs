//! Generative-backend request/response shapes.
//!
//! Shaped after the Anthropic Messages API request/response structs — a
//! `role` + `content` message list, tagged content blocks — generalized to
//! carry the `thinking`/`redacted_thinking` block kinds the specification
//! requires every caller to never see.

use serde::{Deserialize, Serialize};

/// A single message in a generative request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    /// `"user"` or `"model"`.
    pub role: String,
    /// The message content.
    pub content: RequestContent,
}

/// Content can be a plain string or an array of typed blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestContent {
    /// Plain text shorthand.
    Text(String),
    /// A sequence of typed content blocks.
    Blocks(Vec<RequestBlock>),
}

/// A content block accepted in a generative request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A reference to previously uploaded file content.
    FileRef {
        /// The backend-assigned file URI.
        uri: String,
        /// MIME type of the referenced content.
        mime_type: String,
    },
    /// Raw bytes small enough to inline directly into the request, base64-encoded.
    InlineData {
        /// MIME type of the inlined content.
        mime_type: String,
        /// Base64-encoded bytes.
        data: String,
    },
    /// A reference to a previously registered backend context cache.
    CachedContent {
        /// The backend-assigned cache name.
        cache_name: String,
    },
}

/// Request body sent to the generative backend.
#[derive(Debug, Clone, Serialize)]
pub struct GenerativeRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<RequestMessage>,
    /// Sampling temperature, clamped to `[0, 2]` by the caller.
    pub temperature: f64,
    /// System instruction, plumbed through unchanged on every call path —
    /// an anti-injection invariant: fallback/reshape calls MUST reuse it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Requested reasoning depth.
    pub thinking_level: scout_types::ThinkingLevel,
    /// JSON Schema the response must validate against, if structured output was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    /// Request-scoped backend tool wiring (grounding search, URL context, …).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
}

/// A content block in a generative response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    /// User-visible text.
    Text {
        /// The text.
        text: String,
    },
    /// Internal reasoning. Never surfaced to a caller.
    Thinking {
        /// Opaque reasoning text.
        thinking: String,
    },
    /// Internal reasoning the backend redacted before returning it. Never surfaced.
    RedactedThinking {
        /// Opaque redacted payload.
        data: String,
    },
}

/// Response body from the generative backend.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerativeResponse {
    /// Response content blocks.
    pub content: Vec<ResponseBlock>,
    /// Model that generated the response.
    pub model: String,
    /// Why generation stopped.
    pub stop_reason: String,
    /// Token usage.
    pub usage: GenerativeUsage,
}

/// Token usage reported by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerativeUsage {
    /// Input tokens consumed.
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens produced.
    #[serde(default)]
    pub output_tokens: u64,
    /// Tokens served from a backend context cache, if any.
    #[serde(default)]
    pub cached_input_tokens: Option<u64>,
}

/// Extract only the user-visible text from a response, in order, dropping
/// every `Thinking`/`RedactedThinking` block. This is the sole place
/// thinking-stripping happens; every caller of the generative client sees
/// only this function's output.
pub fn extract_visible_text(response: &GenerativeResponse) -> String {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text.as_str()),
            ResponseBlock::Thinking { .. } | ResponseBlock::RedactedThinking { .. } => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_visible_text_drops_thinking_blocks() {
        let response = GenerativeResponse {
            content: vec![
                ResponseBlock::Thinking { thinking: "let me consider...".into() },
                ResponseBlock::Text { text: "The answer is 42.".into() },
                ResponseBlock::RedactedThinking { data: "opaque".into() },
            ],
            model: "scout-pro-2".into(),
            stop_reason: "end_turn".into(),
            usage: GenerativeUsage::default(),
        };
        assert_eq!(extract_visible_text(&response), "The answer is 42.");
    }

    #[test]
    fn extract_visible_text_joins_multiple_text_blocks() {
        let response = GenerativeResponse {
            content: vec![
                ResponseBlock::Text { text: "Part one. ".into() },
                ResponseBlock::Text { text: "Part two.".into() },
            ],
            model: "scout-pro-2".into(),
            stop_reason: "end_turn".into(),
            usage: GenerativeUsage::default(),
        };
        assert_eq!(extract_visible_text(&response), "Part one. Part two.");
    }

    #[test]
    fn request_content_text_shorthand_serializes_as_plain_string() {
        let content = RequestContent::Text("hello".into());
        assert_eq!(serde_json::to_value(&content).unwrap(), serde_json::json!("hello"));
    }
}
