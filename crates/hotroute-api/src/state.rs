//! State shared by all handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use hotroute_host::SharedHost;
use hotroute_plugin::PluginManager;

/// Handler state.
#[derive(Clone)]
pub struct ApiState {
    /// Lifecycle calls are serialized through this lock.
    pub manager: Arc<Mutex<PluginManager>>,
    /// The host requests are dispatched into.
    pub host: SharedHost,
}

impl ApiState {
    /// Wraps `manager`, sharing its host.
    pub fn new(manager: PluginManager) -> Self {
        let host = manager.host().clone();
        Self {
            manager: Arc::new(Mutex::new(manager)),
            host,
        }
    }
}
