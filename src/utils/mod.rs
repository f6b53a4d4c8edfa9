pub mod errors;

pub use errors::{BridgeError, BridgeResult};
