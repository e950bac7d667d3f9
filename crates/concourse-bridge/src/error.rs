//! Error types for concourse-bridge

use thiserror::Error;

/// Errors raised while talking to the build metadata or orchestration services.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The named upstream has no base URL configured
    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },

    /// A base URL could not be parsed or extended
    #[error("invalid {service} URL: {reason}")]
    InvalidUrl {
        service: &'static str,
        reason: String,
    },

    /// The request never produced a response (connect, timeout, TLS)
    #[error("{service} request failed: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The upstream answered with a non-success status
    #[error("{service} responded with HTTP {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The upstream body was not the expected JSON
    #[error("{service} returned an unreadable body: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
}

impl BridgeError {
    /// Whether the failure came from the remote side rather than local setup.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BridgeError::Transport { .. } | BridgeError::Upstream { .. } | BridgeError::Decode { .. }
        )
    }
}
