use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::error::AppError;
use crate::features::complaints::models::{ComplaintCategory, Department};
use crate::features::drafts::dtos::ComplaintDraftDto;
use crate::shared::llm::LlmResponse;

/// Structured reply expected from the vision model
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DraftReply {
    /// A draft complaint describing the problem shown in the photo
    pub complaint_draft: String,

    /// The category of the complaint
    #[serde(default)]
    #[schemars(with = "ComplaintCategory")]
    pub category: String,

    /// The department responsible for handling the complaint
    #[serde(default)]
    #[schemars(with = "Department")]
    pub department: String,

    #[serde(skip)]
    #[schemars(skip)]
    fallback_error: Option<String>,
}

impl LlmResponse for DraftReply {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.fallback_error = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.fallback_error.is_none()
    }

    fn fallback_reason(&self) -> Option<&str> {
        self.fallback_error.as_deref()
    }
}

impl DraftReply {
    /// Validate the reply and force the department to follow the category
    pub fn into_draft(self) -> Result<ComplaintDraftDto, AppError> {
        if let Some(reason) = self.fallback_reason() {
            return Err(AppError::ExternalServiceError(format!(
                "Unusable model reply: {}",
                reason
            )));
        }

        let complaint_draft = self.complaint_draft.trim().to_string();
        if complaint_draft.is_empty() {
            return Err(AppError::ExternalServiceError(
                "Model returned an empty complaint draft".to_string(),
            ));
        }

        let category = ComplaintCategory::parse(&self.category).unwrap_or_else(|| {
            tracing::warn!(
                "Model returned unknown category '{}', using Other",
                self.category
            );
            ComplaintCategory::Other
        });
        let department = category.department();

        if Department::parse(&self.department) != Some(department) {
            tracing::warn!(
                "Model assigned '{}' to {} complaint, using {}",
                self.department,
                category,
                department
            );
        }

        Ok(ComplaintDraftDto {
            complaint_draft,
            category,
            department,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::llm::parse_with_fallback;

    #[test]
    fn test_reply_is_normalized_to_mapping() {
        let reply: DraftReply = parse_with_fallback(
            r#"{"complaint_draft": "Trash bags piled on the sidewalk.", "category": "Trash", "department": "Public Works"}"#,
        );

        let draft = reply.into_draft().unwrap();
        assert_eq!(draft.category, ComplaintCategory::Trash);
        assert_eq!(draft.department, Department::Sanitation);
    }

    #[test]
    fn test_unknown_category_becomes_other() {
        let reply: DraftReply = parse_with_fallback(
            "```json\n{\"complaint_draft\": \"Fallen tree blocks the road.\", \"category\": \"Tree\"}\n```",
        );

        let draft = reply.into_draft().unwrap();
        assert_eq!(draft.category, ComplaintCategory::Other);
        assert_eq!(draft.department, Department::GeneralAdministration);
    }

    #[test]
    fn test_missing_category_becomes_other() {
        let reply: DraftReply = parse_with_fallback(
            r#"{"complaint_draft": "Bench in the park is broken."}"#,
        );
        assert!(reply.is_success());

        let draft = reply.into_draft().unwrap();
        assert_eq!(draft.category, ComplaintCategory::Other);
        assert_eq!(draft.department, Department::GeneralAdministration);
    }

    #[test]
    fn test_fallback_reply_is_an_external_error() {
        let reply: DraftReply = parse_with_fallback("I'm unable to view images.");
        assert!(!reply.is_success());
        assert!(matches!(
            reply.into_draft(),
            Err(AppError::ExternalServiceError(_))
        ));
    }

    #[test]
    fn test_empty_draft_is_rejected() {
        let reply: DraftReply =
            parse_with_fallback(r#"{"complaint_draft": "  ", "category": "Graffiti"}"#);
        assert!(reply.into_draft().is_err());
    }

    #[test]
    fn test_schema_lists_enumerations() {
        let schema = DraftReply::json_schema_string();
        assert!(schema.contains("Broken Streetlight"));
        assert!(schema.contains("General Administration"));
        assert!(schema.contains("complaint_draft"));
        assert!(!schema.contains("fallback_error"));
    }
}
