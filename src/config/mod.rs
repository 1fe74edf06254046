pub mod database;
pub mod environment;
pub mod rpc_config;
pub mod settings;
pub mod store;

pub use database::{init_db, DbPool};
pub use environment::Environment;
pub use rpc_config::{RpcDirectory, RpcEndpoint};
pub use settings::{NodePeer, Peer, Settings};
pub use store::{ConfigError, ConfigStore};
