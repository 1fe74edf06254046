pub mod aggregator;
pub mod gate;
pub mod hashing;
pub mod jwt;
pub mod metrics;
pub mod remote;
pub mod scheduler;
pub mod security;
pub mod sink;
