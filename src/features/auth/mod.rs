pub mod dtos;
pub mod handlers;
pub mod model;
pub mod password;
pub mod routes;
pub mod services;
pub mod session;

pub use model::AuthenticatedEmployee;
pub use services::AuthService;
pub use session::SessionManager;
