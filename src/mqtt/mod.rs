//! Short-lived MQTT publishing.
//!
//! Every publish opens its own connection, waits for the broker to acknowledge,
//! and disconnects again. No connection is shared between requests.

mod publisher;

use futures::future::BoxFuture;
use std::time::Duration;

pub use publisher::MqttPublisher;

/// Broker endpoint and connection behaviour for [`MqttPublisher`].
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    /// Client ids are `<prefix>_<unix millis>_<sequence>` so concurrent requests never collide.
    pub client_id_prefix: String,
    /// Bounds the connect phase only; waiting for the publish ack is unbounded.
    pub connect_timeout: Duration,
    pub keep_alive: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("no connection to broker within {0:?}")]
    ConnectTimeout(Duration),

    #[error(transparent)]
    Connection(#[from] rumqttc::ConnectionError),

    #[error(transparent)]
    Publish(#[from] rumqttc::ClientError),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Publishes a single message and resolves once the broker has acknowledged it.
pub trait ConfigPublisher: Send + Sync {
    fn publish<'a>(&'a self, topic: &'a str, payload: Vec<u8>)
    -> BoxFuture<'a, Result<(), PublishError>>;
}
