//! Cache key layout: `{content_id}_{tool}_{md5_8(instruction)|"default"}_{md5_8(model)}.json`.

/// First 8 hex characters of the MD5 digest of `s`. Collisions within a
/// single content_id/tool pair are cosmetically possible but harmless: a
/// clash only ever causes one cache entry to be treated as a hit for a
/// slightly different instruction, never data corruption.
fn md5_8(s: &str) -> String {
    let digest = md5::compute(s.as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

/// Build the on-disk filename (without directory) for a cache entry.
pub fn cache_key(content_id: &str, tool: &str, instruction: Option<&str>, model: &str) -> String {
    let instruction_part = match instruction {
        Some(text) if !text.is_empty() => md5_8(text),
        _ => "default".to_string(),
    };
    format!("{content_id}_{tool}_{instruction_part}_{}.json", md5_8(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instruction_uses_literal_default_segment() {
        let key = cache_key("vid1", "video_analyze", None, "scout-pro-2");
        assert!(key.contains("_default_"));
    }

    #[test]
    fn empty_instruction_is_treated_as_default() {
        let key = cache_key("vid1", "video_analyze", Some(""), "scout-pro-2");
        assert!(key.contains("_default_"));
    }

    #[test]
    fn distinct_instructions_produce_distinct_keys() {
        let a = cache_key("vid1", "video_analyze", Some("summarize"), "scout-pro-2");
        let b = cache_key("vid1", "video_analyze", Some("transcribe"), "scout-pro-2");
        assert_ne!(a, b);
    }

    #[test]
    fn key_is_stable_for_same_inputs() {
        let a = cache_key("vid1", "video_analyze", Some("summarize"), "scout-pro-2");
        let b = cache_key("vid1", "video_analyze", Some("summarize"), "scout-pro-2");
        assert_eq!(a, b);
    }
}
