pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use handlers::ComplaintState;
pub use services::ComplaintService;
