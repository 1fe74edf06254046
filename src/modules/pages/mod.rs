pub mod controller;
pub mod routes;

pub use routes::page_routes;
