//! Shared handler state.

use std::sync::Arc;

use canary_core::JudgeService;
use concourse_bridge::ConcourseBridge;

#[derive(Clone)]
pub struct AppState {
    pub judges: JudgeService,
    pub bridge: Arc<ConcourseBridge>,
}

impl AppState {
    pub fn new(judges: JudgeService, bridge: ConcourseBridge) -> Self {
        Self {
            judges,
            bridge: Arc::new(bridge),
        }
    }
}
