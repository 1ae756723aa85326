use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Broker configuration updates are published to (`host:port`)
    pub broker: String,
}

/// Liveness probe
///
/// Does not contact the broker; connections are only opened per update request.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        broker: format!(
            "{}:{}",
            state.config.mqtt_broker_host, state.config.mqtt_broker_port
        ),
    })
}
