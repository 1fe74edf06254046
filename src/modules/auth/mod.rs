pub mod controller;
pub mod crud;
pub mod middleware;
pub mod routes;
pub mod schema;

pub use middleware::{require_session, SessionUser};
pub use routes::auth_routes;
