use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ComplaintDrafter, DraftReply};
use crate::core::config::AiConfig;
use crate::core::error::{AppError, Result};
use crate::features::complaints::models::{ComplaintCategory, Department};
use crate::features::drafts::dtos::{ComplaintDraftDto, GenerateComplaintDto};
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::templates::render_template;

const SYSTEM_TEMPLATE: &str = "prompts/complaint_draft/system.jinja";
const USER_TEMPLATE: &str = "prompts/complaint_draft/user.jinja";
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct MappingRule {
    category: &'static str,
    department: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Drafts complaints with an OpenAI-compatible vision model
pub struct VisionDrafter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl VisionDrafter {
    /// Returns `Ok(None)` when no API key is configured
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("IssueSnap/1.0")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url),
            api_key,
            model: config.model.clone(),
        }))
    }

    /// Render the system prompt with the category and department lists
    pub fn system_prompt() -> Result<String> {
        let categories: Vec<&str> = ComplaintCategory::ALL.iter().map(|c| c.as_str()).collect();
        let departments: Vec<&str> = Department::ALL.iter().map(|d| d.as_str()).collect();
        let mapping: Vec<MappingRule> = ComplaintCategory::ALL
            .iter()
            .map(|c| MappingRule {
                category: c.as_str(),
                department: c.department().as_str(),
            })
            .collect();

        render_template(
            SYSTEM_TEMPLATE,
            json!({
                "categories": categories,
                "departments": departments,
                "mapping": mapping,
                "json_schema": DraftReply::json_schema_string(),
            }),
        )
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    pub fn user_prompt(input: &GenerateComplaintDto) -> Result<String> {
        render_template(
            USER_TEMPLATE,
            json!({ "location_description": input.location_description.trim() }),
        )
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn request_body(&self, input: &GenerateComplaintDto) -> Result<Value> {
        Ok(json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": Self::system_prompt()? },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": Self::user_prompt(input)? },
                        { "type": "image_url", "image_url": { "url": input.photo_data_uri } }
                    ]
                }
            ]
        }))
    }

    async fn complete(&self, body: &Value) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Vision model request failed: {}", e);
                AppError::ExternalServiceError(format!("Vision model request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Vision model returned {}: {}", status, detail);
            return Err(AppError::ExternalServiceError(format!(
                "Vision model returned status {}",
                status
            )));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse vision model response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse vision model response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::ExternalServiceError("Vision model returned no content".to_string())
            })
    }
}

#[async_trait]
impl ComplaintDrafter for VisionDrafter {
    async fn draft(&self, input: &GenerateComplaintDto) -> Result<ComplaintDraftDto> {
        let body = self.request_body(input)?;
        let content = self.complete(&body).await?;

        let draft = parse_with_fallback::<DraftReply>(&content).into_draft()?;
        tracing::info!(
            category = %draft.category,
            department = %draft.department,
            "Drafted complaint"
        );
        Ok(draft)
    }
}
