//! Core types for watching mining pools
//!
//! This library provides:
//! - The configuration file model and the immutable pool registry
//! - Resolved per-endpoint check parameters
//! - The state store holding the last-known status of every endpoint

pub mod config;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod status;

pub use config::WatchConfig;
pub use endpoint::{BackendType, EndpointConfig};
pub use error::{CoreError, Result};
pub use registry::PoolRegistry;
pub use status::{EndpointStatus, StateStore, Transition};
