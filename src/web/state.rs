use std::sync::Arc;

use chrono::Duration;

use crate::predict::ObserverSite;
use crate::service::IssService;

use super::config::{Config, ConfigError};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: IssService,
    /// Observer used when a request names no location.
    pub home: ObserverSite,
    /// Default pass search window.
    pub window: Duration,
}

impl AppState {
    pub fn new(config: Config, service: IssService) -> Result<Self, ConfigError> {
        Ok(Self {
            home: config.home_observer()?,
            window: config.window()?,
            config: Arc::new(config),
            service,
        })
    }
}
