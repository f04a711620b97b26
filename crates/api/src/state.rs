use std::sync::Arc;

use devsync_db::StoreHandle;

use crate::config::ServerConfig;
use crate::controller::Controllers;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`. Controllers and their
/// access policies are built once and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Store every module runs its statements against.
    pub store: StoreHandle,
    pub config: Arc<ServerConfig>,
    pub controllers: Arc<Controllers>,
}

impl AppState {
    pub fn new(store: StoreHandle, config: ServerConfig) -> Self {
        let controllers = Controllers::new(&config);
        Self {
            store,
            config: Arc::new(config),
            controllers: Arc::new(controllers),
        }
    }
}
