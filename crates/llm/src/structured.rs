/// Extract the first valid JSON value from an LLM response — fenced
/// ` ```json ... ``` ` block first, falling back to the first brace-matched
/// `{...}` span. Returns `None` on unparseable output, letting the caller
/// fall back to its own deterministic default (spec.md §7 "Semantic"
/// errors).
pub fn extract_json_output<T: serde::de::DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(json_start) = after_fence.find(|c: char| !c.is_whitespace()) {
            let json_body = &after_fence[json_start..];
            if let Some(fence_end) = json_body.find("```") {
                let json_str = json_body[..fence_end].trim();
                if let Ok(val) = serde_json::from_str(json_str) {
                    return Some(val);
                }
            }
        }
    }

    let trimmed = response.trim();
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                let candidate = &trimmed[start..=end];
                if let Ok(val) = serde_json::from_str(candidate) {
                    return Some(val);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Decision {
        decision: String,
    }

    #[test]
    fn extracts_fenced_json() {
        let raw = "Sure!\n```json\n{\"decision\":\"APPROVE\"}\n```";
        let parsed: Decision = extract_json_output(raw).unwrap();
        assert_eq!(parsed.decision, "APPROVE");
    }

    #[test]
    fn extracts_bare_json() {
        let raw = "here you go {\"decision\":\"REJECT\"} thanks";
        let parsed: Decision = extract_json_output(raw).unwrap();
        assert_eq!(parsed.decision, "REJECT");
    }

    #[test]
    fn unparseable_text_returns_none() {
        assert!(extract_json_output::<Decision>("no json here").is_none());
    }
}
