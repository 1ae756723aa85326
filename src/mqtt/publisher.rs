use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, NetworkOptions, Outgoing, Packet,
    QoS,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time;

use super::{ConfigPublisher, MqttSettings, PublishError};

/// Capacity of the client request channel; one publish and one disconnect per connection.
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Disambiguates client ids created within the same millisecond.
static CLIENT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub struct MqttPublisher {
    settings: MqttSettings,
}

impl MqttPublisher {
    #[must_use]
    pub fn new(settings: MqttSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    /// Fresh client id, `<prefix>_<unix millis>_<sequence>`, unique within the process.
    #[must_use]
    pub fn client_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.settings.client_id_prefix,
            Utc::now().timestamp_millis(),
            CLIENT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        )
    }

    /// Connect, publish once with QoS 1, wait for the PUBACK and disconnect.
    ///
    /// The event loop is never polled again after an error, so the client never
    /// reconnects. Dropping it on an error path closes the socket.
    async fn publish_once(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        let client_id = self.client_id();
        let mut options = MqttOptions::new(
            client_id.clone(),
            self.settings.host.clone(),
            self.settings.port,
        );
        options
            .set_clean_session(true)
            .set_keep_alive(self.settings.keep_alive);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        // rumqttc applies its own connect deadline (5s by default); align it with ours.
        let mut network_options = NetworkOptions::new();
        network_options.set_connection_timeout(self.settings.connect_timeout.as_secs().max(1));
        eventloop.set_network_options(network_options);

        tracing::info!(
            client_id = %client_id,
            host = %self.settings.host,
            port = self.settings.port,
            "Connecting to MQTT broker"
        );

        let connect_timeout = self.settings.connect_timeout;
        match time::timeout(connect_timeout, wait_for_connack(&mut eventloop)).await {
            Ok(Ok(())) => {}
            Ok(Err(ConnectionError::NetworkTimeout)) | Err(_) => {
                tracing::warn!(timeout = ?connect_timeout, "Timed out connecting to MQTT broker");
                return Err(PublishError::ConnectTimeout(connect_timeout));
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "MQTT connection failed");
                return Err(e.into());
            }
        }

        tracing::info!(client_id = %client_id, "Connected to MQTT broker");
        tracing::info!(topic = %topic, "Publishing sensor configuration");
        tracing::debug!(payload = %String::from_utf8_lossy(&payload), "MQTT payload");

        // Past this point only connection errors end the wait; there is no deadline.
        client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await?;

        if let Err(e) = wait_for_puback(&mut eventloop).await {
            tracing::warn!(error = %e, topic = %topic, "MQTT connection lost before PUBACK");
            return Err(e.into());
        }

        tracing::info!(topic = %topic, "Configuration published");
        disconnect(&client, &mut eventloop, connect_timeout).await;
        Ok(())
    }
}

impl ConfigPublisher for MqttPublisher {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), PublishError>> {
        self.publish_once(topic, payload).boxed()
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = eventloop.poll().await? {
            return Ok(());
        }
    }
}

async fn wait_for_puback(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    let mut pkid = None;
    loop {
        match eventloop.poll().await? {
            Event::Outgoing(Outgoing::Publish(id)) => pkid = Some(id),
            Event::Incoming(Packet::PubAck(ack)) if Some(ack.pkid) == pkid => return Ok(()),
            _ => {}
        }
    }
}

/// Send DISCONNECT and drive the event loop until it has been written out.
async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop, limit: std::time::Duration) {
    if let Err(e) = client.disconnect().await {
        tracing::debug!(error = %e, "Failed to queue MQTT disconnect");
        return;
    }

    let flush = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "MQTT event loop closed during disconnect");
                    break;
                }
            }
        }
    };

    if time::timeout(limit, flush).await.is_err() {
        tracing::debug!("MQTT disconnect not flushed in time, dropping connection");
    }
}
