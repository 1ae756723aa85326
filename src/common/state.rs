use std::sync::Arc;

use crate::config::Config;
use crate::mqtt::{ConfigPublisher, MqttPublisher};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Arc<dyn ConfigPublisher>,
}

impl AppState {
    /// State backed by a real broker connection per request.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let publisher = MqttPublisher::new(config.mqtt_settings());
        Self::with_publisher(config, Arc::new(publisher))
    }

    /// State with a caller-supplied publisher, e.g. a recording mock in tests.
    #[must_use]
    pub fn with_publisher(config: Config, publisher: Arc<dyn ConfigPublisher>) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}
