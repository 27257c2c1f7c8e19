mod complaint_dto;
mod stats_dto;

pub use complaint_dto::*;
pub use stats_dto::*;
