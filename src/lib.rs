//! Two-tier key-value service
//!
//! A storage node keeps key-value bindings in memory and serves them over
//! gRPC (`kv.v1.KeyValue`). A stateless HTTP gateway exposes the same
//! operations as `/kv/{key}` and forwards them to the node.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use store::Store;
