pub mod client;
pub mod rpc;

pub use client::{RemoteClient, RemoteError};
