use axum::extract::Multipart;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::complaints::dtos::SubmitComplaintDto;
use crate::modules::storage::ImageUpload;

const IMAGE_FIELD: &str = "image";

/// Fields of a complaint multipart form
#[derive(Debug, Default)]
pub struct ComplaintForm {
    pub image: Option<ImageUpload>,
    pub fields: HashMap<String, String>,
}

impl ComplaintForm {
    pub async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();

            if name == IMAGE_FIELD {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read image bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read image data: {}", e))
                })?;

                // browsers send an empty part when no file was chosen
                if !data.is_empty() {
                    form.image = Some(ImageUpload::new(data.to_vec(), content_type, file_name));
                }
            } else if !name.is_empty() {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn require_image(&mut self) -> Result<ImageUpload, AppError> {
        self.image
            .take()
            .ok_or_else(|| AppError::Validation("Please select an image".to_string()))
    }

    fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn number(&self, name: &str, label: &str) -> Result<f64, AppError> {
        self.fields
            .get(name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| AppError::Validation(format!("{} is required", label)))
    }

    /// Text fields of a citizen submission
    pub fn submission(&self) -> Result<SubmitComplaintDto, AppError> {
        Ok(SubmitComplaintDto {
            issue: self.text("issue"),
            location_description: self.text("location_description"),
            latitude: self.number("latitude", "Latitude")?,
            longitude: self.number("longitude", "Longitude")?,
            category: self
                .fields
                .get("category")
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}
