use std::sync::Arc;

use crate::config::AppConfig;
use crate::observability::AppMetrics;
use crate::services::registry::SessionRegistry;
use crate::services::turn::TurnService;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Turn service driving the detection + engagement pipeline
    pub turn_service: Arc<dyn TurnService>,
    /// In-memory session registry
    pub registry: Arc<SessionRegistry>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Metrics counters
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("turn_service", &"Arc<dyn TurnService>")
            .field("registry", &"Arc<SessionRegistry>")
            .field("config", &self.config.app_name)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        turn_service: Box<dyn TurnService>,
        registry: Arc<SessionRegistry>,
        config: AppConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            turn_service: Arc::from(turn_service),
            registry,
            config: Arc::new(config),
            metrics,
        }
    }
}
