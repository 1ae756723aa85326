use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::mqtt::PublishError;

use super::types::{UpdateSensorConfigRequest, UpdateSensorConfigResponse};

/// Update a sensor's configuration and push it to the device over MQTT
///
/// Publishes the normalized configuration with QoS 1 on
/// `ong/sensor/{serial}/config`. Each request uses its own broker connection.
#[utoipa::path(
    post,
    path = "/api/update-sensor-config",
    request_body = UpdateSensorConfigRequest,
    responses(
        (status = 200, description = "Configuration published", body = UpdateSensorConfigResponse),
        (status = 400, description = "Missing required field, invalid serial or malformed body"),
        (status = 405, description = "Method not allowed"),
        (status = 500, description = "Broker timeout, connection error or publish failure"),
    ),
    tag = "sensors"
)]
pub async fn update_sensor_config(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<UpdateSensorConfigResponse>> {
    let Json(body) = body.map_err(|e| AppError::InvalidBody(e.body_text()))?;

    let (serial, config) = UpdateSensorConfigRequest::from_json(body, Utc::now())?;

    let topic = serial.config_topic();
    let payload = config.to_payload().map_err(PublishError::from)?;

    tracing::debug!(
        serial = %serial,
        id_sensor = config.id_sensor,
        topic = %topic,
        "Sensor configuration validated"
    );

    state.publisher.publish(&topic, payload).await?;

    Ok(Json(UpdateSensorConfigResponse {
        success: true,
        message: "Configuration updated and published to MQTT".to_string(),
        serial,
        sensor_type: serial.kind().to_string(),
        topic,
        config,
    }))
}

/// Any method other than POST on the update endpoint
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
