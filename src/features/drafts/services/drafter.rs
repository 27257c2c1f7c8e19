use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::drafts::dtos::{ComplaintDraftDto, GenerateComplaintDto};

/// Turns a photo and a location into a complaint draft
#[async_trait]
pub trait ComplaintDrafter: Send + Sync {
    async fn draft(&self, input: &GenerateComplaintDto) -> Result<ComplaintDraftDto>;
}
