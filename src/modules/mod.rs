//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the S3-compatible object store used for complaint photos.

pub mod storage;
