//! Pulls a node's TLS certificates onto the panel host and mounts them into a compose service.

pub mod compose;
pub mod config;
pub mod error;
pub mod node;
pub mod pipeline;
pub mod prompt;
pub mod restart;
pub mod runner;
pub mod transfer;
pub mod utils;

pub use error::{CertSyncError, Result};
