pub mod auth;
pub mod bootstrap;
pub mod configuration;
pub mod history;
pub mod instance;
pub mod metrics;
pub mod pages;
pub mod systems;
