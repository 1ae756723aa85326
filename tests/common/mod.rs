//! Shared fixtures: a recording publisher and a minimal in-process MQTT 3.1.1 broker.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::future::BoxFuture;
use sensor_config_api::common::AppState;
use sensor_config_api::config::Config;
use sensor_config_api::mqtt::{ConfigPublisher, MqttSettings, PublishError};
use sensor_config_api::routes::build_router;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tower::util::ServiceExt; // for `oneshot`

#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Published {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap()
    }

    pub fn payload_json(&self) -> Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Records every publish and answers with a fixed outcome.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<Published>>,
    failure: Option<fn() -> PublishError>,
}

impl RecordingPublisher {
    pub fn failing(failure: fn() -> PublishError) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            failure: Some(failure),
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

impl ConfigPublisher for RecordingPublisher {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: Vec<u8>,
    ) -> BoxFuture<'a, Result<(), PublishError>> {
        Box::pin(async move {
            if let Some(failure) = self.failure {
                return Err(failure());
            }
            self.published.lock().unwrap().push(Published {
                topic: topic.to_string(),
                payload,
            });
            Ok(())
        })
    }
}

pub fn test_config() -> Config {
    Config {
        disable_rate_limiting: true,
        ..Config::default()
    }
}

pub fn router_with(publisher: Arc<dyn ConfigPublisher>) -> Router {
    build_router(AppState::with_publisher(test_config(), publisher))
}

pub async fn send(app: Router, method: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri("/api/update-sensor-config");
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn local_settings(port: u16, connect_timeout: Duration) -> MqttSettings {
    MqttSettings {
        host: "127.0.0.1".to_string(),
        port,
        client_id_prefix: "test_client".to_string(),
        connect_timeout,
        keep_alive: Duration::from_secs(30),
    }
}

/// How the fake broker answers a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerBehaviour {
    /// CONNACK accepted, PUBACK every QoS 1 publish.
    Ack,
    /// CONNACK with return code 5 (not authorized).
    RefuseConnect,
    /// CONNACK accepted, then hang up on the first PUBLISH.
    DropOnPublish,
}

#[derive(Debug, Default)]
pub struct BrokerLog {
    pub client_id: String,
    /// Fixed header flags (low nibble) of each PUBLISH
    pub publish_flags: Vec<u8>,
    pub published: Vec<Published>,
    pub disconnected: bool,
}

pub struct FakeBroker {
    pub port: u16,
    handle: JoinHandle<BrokerLog>,
}

impl FakeBroker {
    pub async fn start(behaviour: BrokerBehaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            serve_client(stream, behaviour).await
        });
        Self { port, handle }
    }

    /// Wait for the client session to end and return what the broker saw.
    pub async fn finish(self) -> BrokerLog {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("broker session did not end")
            .unwrap()
    }
}

async fn serve_client(mut stream: TcpStream, behaviour: BrokerBehaviour) -> BrokerLog {
    let mut log = BrokerLog::default();

    while let Some((header, body)) = read_packet(&mut stream).await {
        match header >> 4 {
            // CONNECT
            1 => {
                log.client_id = connect_client_id(&body);
                let code = if behaviour == BrokerBehaviour::RefuseConnect { 5 } else { 0 };
                stream.write_all(&[0x20, 0x02, 0x00, code]).await.unwrap();
                if code != 0 {
                    break;
                }
            }
            // PUBLISH
            3 => {
                if behaviour == BrokerBehaviour::DropOnPublish {
                    break;
                }
                let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let topic = String::from_utf8(body[2..2 + topic_len].to_vec()).unwrap();
                let qos = (header >> 1) & 0x03;
                let mut offset = 2 + topic_len;
                if qos > 0 {
                    let pkid = [body[offset], body[offset + 1]];
                    offset += 2;
                    stream
                        .write_all(&[0x40, 0x02, pkid[0], pkid[1]])
                        .await
                        .unwrap();
                }
                log.publish_flags.push(header & 0x0F);
                log.published.push(Published {
                    topic,
                    payload: body[offset..].to_vec(),
                });
            }
            // PINGREQ
            12 => stream.write_all(&[0xD0, 0x00]).await.unwrap(),
            // DISCONNECT
            14 => {
                log.disconnected = true;
                break;
            }
            _ => {}
        }
    }

    log
}

async fn read_packet(stream: &mut TcpStream) -> Option<(u8, Vec<u8>)> {
    let header = stream.read_u8().await.ok()?;
    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await.ok()?;
        len |= usize::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let mut body = vec![0; len];
    stream.read_exact(&mut body).await.ok()?;
    Some((header, body))
}

/// Client id from a CONNECT body: protocol name, level, flags and keep-alive come first.
fn connect_client_id(body: &[u8]) -> String {
    let name_len = u16::from_be_bytes([body[0], body[1]]) as usize;
    let start = 2 + name_len + 4;
    let id_len = u16::from_be_bytes([body[start], body[start + 1]]) as usize;
    String::from_utf8(body[start + 2..start + 2 + id_len].to_vec()).unwrap()
}
