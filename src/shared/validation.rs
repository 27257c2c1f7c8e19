use std::borrow::Borrow;

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::shared::constants::ALLOWED_IMAGE_TYPES;

lazy_static! {
    /// Base64 image data URI as produced by a browser `FileReader`
    /// - Valid: "data:image/jpeg;base64,/9j/4AAQ", "data:image/png;base64,iVBORw0K"
    /// - Invalid: "data:text/plain;base64,aGk=", "image/png;base64,abc", "data:image/png,abc"
    pub static ref IMAGE_DATA_URI_REGEX: Regex =
        Regex::new(r"^data:(image/[a-zA-Z0-9.+-]+);base64,([A-Za-z0-9+/=\r\n]+)$").unwrap();
}

/// MIME type of an image data URI, if it is one
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    IMAGE_DATA_URI_REGEX
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn validate_image_data_uri(uri: &str) -> Result<(), ValidationError> {
    match data_uri_mime(uri) {
        Some(mime) if ALLOWED_IMAGE_TYPES.contains(&mime.to_ascii_lowercase().as_str()) => Ok(()),
        _ => Err(ValidationError::new("image_data_uri")
            .with_message("Photo must be a base64 encoded JPEG, PNG, WebP or GIF data URI".into())),
    }
}

pub fn validate_latitude(value: impl Borrow<f64>) -> Result<(), ValidationError> {
    let value = value.borrow();
    if value.is_finite() && (-90.0..=90.0).contains(value) {
        Ok(())
    } else {
        Err(ValidationError::new("latitude")
            .with_message("Latitude must be between -90 and 90".into()))
    }
}

pub fn validate_longitude(value: impl Borrow<f64>) -> Result<(), ValidationError> {
    let value = value.borrow();
    if value.is_finite() && (-180.0..=180.0).contains(value) {
        Ok(())
    } else {
        Err(ValidationError::new("longitude")
            .with_message("Longitude must be between -180 and 180".into()))
    }
}

/// Location text used when the citizen only shares coordinates
pub fn approximate_location(latitude: f64, longitude: f64) -> String {
    format!("approx. {:.4}, {:.4}", latitude, longitude)
}

/// Flatten `validator` errors into user-facing messages
pub fn collect_messages(errors: &validator::ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_uri_valid() {
        assert!(validate_image_data_uri("data:image/jpeg;base64,/9j/4AAQSkZJRg==").is_ok());
        assert!(validate_image_data_uri("data:image/png;base64,iVBORw0KGgo=").is_ok());
        assert_eq!(
            data_uri_mime("data:image/webp;base64,UklGRg=="),
            Some("image/webp")
        );
    }

    #[test]
    fn test_image_data_uri_invalid() {
        assert!(validate_image_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(validate_image_data_uri("image/png;base64,abc").is_err());
        assert!(validate_image_data_uri("data:image/png,abc").is_err());
        assert!(validate_image_data_uri("data:image/tiff;base64,SUkq").is_err());
        assert!(validate_image_data_uri("").is_err());
    }

    #[test]
    fn test_coordinates() {
        assert!(validate_latitude(&-90.0).is_ok());
        assert!(validate_latitude(&45.5).is_ok());
        assert!(validate_latitude(&90.1).is_err());
        assert!(validate_latitude(&f64::NAN).is_err());
        assert!(validate_longitude(&180.0).is_ok());
        assert!(validate_longitude(&-180.5).is_err());
    }

    #[test]
    fn test_approximate_location() {
        assert_eq!(
            approximate_location(40.712776, -74.005974),
            "approx. 40.7128, -74.0060"
        );
    }
}
