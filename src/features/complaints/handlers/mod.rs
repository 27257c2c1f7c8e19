mod complaint_handler;
pub mod form;

pub use complaint_handler::*;
