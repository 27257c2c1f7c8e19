//! Object storage for complaint photos
//!
//! S3/MinIO client plus the upload rules shared by complaint submission and
//! resolution.

mod image;
mod s3_client;
mod sigv4;

pub use image::ImageUpload;
pub use s3_client::S3Storage;

use async_trait::async_trait;

use crate::core::error::AppError;

/// Public-read object store used by the complaint service
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its public URL
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    fn public_url(&self, key: &str) -> String;
}
