//! Server-rendered HTML pages: the citizen report form and the employee
//! dashboard. Failures are rendered into the page instead of JSON.

pub mod dtos;
pub mod handlers;
pub mod routes;

pub use handlers::PageState;
