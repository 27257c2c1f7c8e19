use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE};

/// Photo received from a multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>, file_name: Option<String>) -> Self {
        Self {
            data,
            content_type: content_type.into().to_ascii_lowercase(),
            file_name,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.data.is_empty() {
            return Err(AppError::Validation("Please select an image".to_string()));
        }

        if self.data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::PayloadTooLarge(format!(
                "Image must be smaller than {}MB",
                MAX_IMAGE_SIZE / (1024 * 1024)
            )));
        }

        if !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Image type '{}' is not supported. Allowed: {}",
                self.content_type,
                ALLOWED_IMAGE_TYPES.join(", ")
            )));
        }

        Ok(())
    }

    /// File extension from the MIME type, else from the uploaded file name
    pub fn extension(&self) -> String {
        let from_mime = match self.content_type.as_str() {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            _ => None,
        };

        from_mime
            .map(str::to_string)
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            })
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Unique object key, e.g. `resolution-<uuid>.jpg`
    pub fn object_key(&self, prefix: &str) -> String {
        format!("{}{}.{}", prefix, Uuid::new_v4(), self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::RESOLUTION_KEY_PREFIX;

    fn upload(size: usize, content_type: &str, file_name: Option<&str>) -> ImageUpload {
        ImageUpload::new(vec![0u8; size], content_type, file_name.map(String::from))
    }

    #[test]
    fn test_validate_accepts_supported_images() {
        assert!(upload(1024, "image/jpeg", Some("a.jpg")).validate().is_ok());
        assert!(upload(MAX_IMAGE_SIZE, "IMAGE/PNG", None).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_oversized() {
        assert!(matches!(
            upload(0, "image/jpeg", None).validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            upload(MAX_IMAGE_SIZE + 1, "image/jpeg", None).validate(),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_validate_rejects_other_types() {
        assert!(matches!(
            upload(10, "application/pdf", Some("scan.pdf")).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_extension_prefers_mime() {
        assert_eq!(upload(1, "image/jpeg", Some("photo.JPEG")).extension(), "jpg");
        assert_eq!(upload(1, "image/webp", None).extension(), "webp");
        assert_eq!(
            upload(1, "application/octet-stream", Some("IMG_01.HEIC")).extension(),
            "heic"
        );
        assert_eq!(upload(1, "application/octet-stream", None).extension(), "bin");
    }

    #[test]
    fn test_object_keys() {
        let image = upload(1, "image/png", None);

        let key = image.object_key("");
        assert!(key.ends_with(".png"));
        assert!(Uuid::parse_str(key.trim_end_matches(".png")).is_ok());

        let resolution = image.object_key(RESOLUTION_KEY_PREFIX);
        assert!(resolution.starts_with("resolution-"));
        assert_ne!(image.object_key(""), key);
    }
}
