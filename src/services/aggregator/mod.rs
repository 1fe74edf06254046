pub mod devices;
pub mod fanout;
pub mod nodes;
pub mod pools;

pub use fanout::{fan_out, FanOutOptions, PeerFailure, PeerKey, PeerOutcome};
