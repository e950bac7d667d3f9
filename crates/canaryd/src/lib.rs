//! canaryd: HTTP front end for canary judges and Concourse build metadata
//!
//! The binary in `main.rs` parses flags, loads [`config::DaemonConfig`] and
//! serves [`routes::router`]. Everything is exposed here so tests can drive
//! the router in process.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, DaemonConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
