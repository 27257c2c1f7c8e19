use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Structured model output that can degrade to a default value.
///
/// When a reply cannot be parsed, `parse_with_fallback` returns
/// `Self::default()` marked as a fallback instead of an error, and the caller
/// decides what a fallback means for its operation.
pub trait LlmResponse: DeserializeOwned + Default + JsonSchema {
    fn mark_as_fallback(&mut self, error_message: String);

    fn is_success(&self) -> bool;

    /// Parse failure recorded by `mark_as_fallback`
    fn fallback_reason(&self) -> Option<&str>;

    /// JSON schema of the response, embedded in prompts
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
