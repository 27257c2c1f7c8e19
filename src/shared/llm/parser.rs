use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// Trailing commas before } or ]
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// Fenced code block, optionally tagged with a language
    static ref CODE_FENCE_RE: Regex = Regex::new(r"(?s)```[a-zA-Z]*\s*\n?(.*?)```").unwrap();
}

/// Pull the JSON object out of a model reply.
///
/// Accepts a fenced code block, a bare object, or an object embedded in
/// surrounding prose.
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if let Some(block) = CODE_FENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
    {
        if block.starts_with('{') {
            return Ok(block.to_string());
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    let start = text
        .find('{')
        .ok_or_else(|| "No JSON object found in response".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "Incomplete JSON object in response".to_string())?;

    if start < end {
        Ok(text[start..=end].to_string())
    } else {
        Err("Invalid JSON boundaries in response".to_string())
    }
}

/// `{"a": 1,}` -> `{"a": 1}`
pub fn fix_trailing_commas(json_str: &str) -> String {
    TRAILING_COMMA_RE.replace_all(json_str, "$1").to_string()
}

fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

fn try_parse<T: LlmResponse>(text: &str) -> Result<T, String> {
    let json_str = extract_json_string(text)?;

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    let fixed = fix_trailing_commas(&json_str);
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed) {
        tracing::debug!("Model JSON parsed after removing trailing commas");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("Model JSON parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Failed to parse JSON after all repair attempts. Original: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parse a model reply, returning a marked default value when it is unusable
pub fn parse_with_fallback<T: LlmResponse>(text: &str) -> T {
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("LLM response parsing failed, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}
