/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// IMAGE UPLOADS
// =============================================================================

/// Maximum size of a complaint or resolution photo (4 MiB)
pub const MAX_IMAGE_SIZE: usize = 4 * 1024 * 1024;

/// Accepted photo MIME types
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Object key prefix for resolution photos
pub const RESOLUTION_KEY_PREFIX: &str = "resolution-";

// =============================================================================
// MESSAGES
// =============================================================================

pub const DRAFTING_DISABLED_MESSAGE: &str = "Complaint drafting is not configured";
