//! Concourse bridge: build metadata lookups and stage start notifications
//!
//! Wraps two upstream HTTP services:
//! - Igor, which knows the teams, pipelines, jobs and resources of each
//!   Concourse build master
//! - Orca, which is told when a Concourse build starts for a pipeline stage
//!
//! Either side may be left unconfigured; calls to it then fail with
//! [`BridgeError::NotConfigured`].

pub mod error;
mod http;
pub mod igor;
pub mod orca;

use std::time::Duration;

pub use error::BridgeError;
pub use igor::IgorClient;
pub use orca::OrcaClient;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Default request timeout for both upstreams.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Both upstream clients, each optional.
#[derive(Debug, Clone, Default)]
pub struct ConcourseBridge {
    igor: Option<IgorClient>,
    orca: Option<OrcaClient>,
}

impl ConcourseBridge {
    /// Build clients for whichever base URLs are given.
    pub fn new(igor_url: Option<&str>, orca_url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            igor: igor_url.map(|u| IgorClient::new(u, timeout)).transpose()?,
            orca: orca_url.map(|u| OrcaClient::new(u, timeout)).transpose()?,
        })
    }

    /// A bridge with neither upstream configured.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn igor(&self) -> Result<&IgorClient> {
        self.igor
            .as_ref()
            .ok_or(BridgeError::NotConfigured { service: "igor" })
    }

    pub fn orca(&self) -> Result<&OrcaClient> {
        self.orca
            .as_ref()
            .ok_or(BridgeError::NotConfigured { service: "orca" })
    }

    pub fn is_igor_configured(&self) -> bool {
        self.igor.is_some()
    }

    pub fn is_orca_configured(&self) -> bool {
        self.orca.is_some()
    }
}
