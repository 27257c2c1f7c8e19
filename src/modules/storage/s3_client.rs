//! S3/MinIO client over rust-s3

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use tracing::{debug, info, warn};

use super::sigv4::SigV4Signer;
use super::ObjectStore;
use crate::core::config::StorageConfig;
use crate::core::error::AppError;

pub struct S3Storage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    config: StorageConfig,
    http_client: Client,
}

impl S3Storage {
    /// Connect to the bucket, creating it and making it publicly readable
    /// when needed.
    pub async fn connect(config: StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to open bucket: {}", e)))?;
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let storage = Self {
            bucket,
            region,
            credentials,
            config,
            http_client,
        };

        storage.ensure_bucket_exists().await;
        storage.apply_public_read_policy().await;

        info!(
            "Object storage ready at {} (bucket: {})",
            storage.config.endpoint, storage.config.bucket
        );

        Ok(storage)
    }

    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.config.bucket,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created", self.config.bucket),
            Err(e) => {
                let message = e.to_string();
                if message.contains("BucketAlreadyOwnedByYou")
                    || message.contains("BucketAlreadyExists")
                    || message.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.config.bucket);
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.config.bucket, e
                    );
                }
            }
        }
    }

    /// Complaint photos are shown directly in the dashboard, so every object
    /// in the bucket is anonymously readable.
    async fn apply_public_read_policy(&self) {
        let policy = public_read_policy(&self.config.bucket);

        if let Err(e) = self.put_bucket_policy(&policy).await {
            warn!(
                "Failed to set bucket policy for '{}': {}. Set it manually with: mc anonymous set download <alias>/{}",
                self.config.bucket, e, self.config.bucket
            );
        } else {
            info!("Public read policy applied to bucket '{}'", self.config.bucket);
        }
    }

    async fn put_bucket_policy(&self, policy: &str) -> Result<(), AppError> {
        let endpoint = Url::parse(&self.config.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid storage endpoint: {}", e)))?;
        let host = endpoint
            .host_str()
            .ok_or_else(|| AppError::Internal("Storage endpoint has no host".to_string()))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let path = format!("/{}", self.config.bucket);
        let signer = SigV4Signer {
            access_key: &self.config.access_key,
            secret_key: &self.config.secret_key,
            region: &self.config.region,
        };
        let signed = signer.sign("PUT", &host, &path, "policy=", policy.as_bytes(), Utc::now())?;

        let response = self
            .http_client
            .put(format!("{}{}?policy", self.config.endpoint, path))
            .header("Host", &host)
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", &signed.payload_hash)
            .header("Authorization", &signed.authorization)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::Internal(format!(
            "Bucket policy rejected: {} - {}",
            status, body
        )))
    }
}

fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {"AWS": "*"},
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{bucket}/*")]
            }
        ]
    })
    .to_string()
}

fn object_url(public_endpoint: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        public_endpoint,
        bucket,
        urlencoding::encode(key)
    )
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload '{}': {}", key, e)))?;

        debug!("Uploaded '{}' ({} bytes)", key, data.len());
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete '{}': {}", key, e)))?;

        debug!("Deleted '{}'", key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        object_url(&self.config.public_endpoint, &self.config.bucket, key)
    }
}
