use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::sensor::{SensorConfig, SensorSerial, DEFAULT_INTERVAL_SECONDS, DEFAULT_STATE};

/// Body of `POST /api/update-sensor-config`.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct UpdateSensorConfigRequest {
    /// Sensor class serial: `0x001C` (humidity) or `0x001D` (light)
    #[schema(example = "0x001C")]
    pub serial: Option<String>,
    #[schema(example = 9)]
    pub id_sensor: Option<i64>,
    /// Sampling interval (default: 20)
    pub interval_seconds: Option<u32>,
    pub max_value: Option<f64>,
    pub min_value: Option<f64>,
    /// Sensor status (default: "active")
    pub state: Option<String>,
    pub id_user_created: Option<i64>,
    /// RFC 3339 timestamp, published as given (default: time of the request)
    #[schema(example = "2025-11-02T15:13:36.296Z")]
    pub created_at: Option<String>,
    pub id_user_modified: Option<i64>,
    /// RFC 3339 timestamp, published as given (default: time of the request)
    pub modified_at: Option<String>,
}

impl UpdateSensorConfigRequest {
    /// Validate a raw JSON body and build the canonical config.
    ///
    /// Required fields and the serial are checked on the untyped body first, so a
    /// request missing `serial` is reported as such even when another field is
    /// malformed. Only then is the body decoded into its typed form.
    ///
    /// # Errors
    ///
    /// `MissingRequiredField`, then `InvalidSerial`, then `InvalidBody` for an
    /// optional field of the wrong type or a timestamp that is not RFC 3339.
    pub fn from_json(body: Value, now: DateTime<Utc>) -> AppResult<(SensorSerial, SensorConfig)> {
        let serial = body.get("serial").filter(|v| is_truthy(v));
        let id_sensor = body.get("id_sensor").filter(|v| is_truthy(v));

        let (Some(serial), Some(_)) = (serial, id_sensor) else {
            return Err(AppError::MissingRequiredField);
        };
        serial
            .as_str()
            .ok_or(AppError::InvalidSerial)?
            .parse::<SensorSerial>()?;

        let request: Self =
            serde_json::from_value(body).map_err(|e| AppError::InvalidBody(e.to_string()))?;
        request.into_config(now)
    }

    /// Check required fields and the serial allow-list, then fill in defaults.
    ///
    /// Zero and empty values count as absent, matching what the web frontend sends
    /// for cleared form fields. `max_value`/`min_value` are the exception: an
    /// explicit 0 is a valid bound.
    ///
    /// # Errors
    ///
    /// `MissingRequiredField` if `serial` or `id_sensor` is absent,
    /// `InvalidSerial` if `serial` is not an allowed sensor class,
    /// `InvalidBody` if a timestamp is not RFC 3339.
    pub fn into_config(self, now: DateTime<Utc>) -> AppResult<(SensorSerial, SensorConfig)> {
        let serial = self.serial.filter(|s| !s.is_empty());
        let id_sensor = self.id_sensor.filter(|&id| id != 0);

        let (Some(serial), Some(id_sensor)) = (serial, id_sensor) else {
            return Err(AppError::MissingRequiredField);
        };

        let serial: SensorSerial = serial.parse()?;
        let now = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        let config = SensorConfig {
            id_sensor,
            interval_seconds: self
                .interval_seconds
                .filter(|&secs| secs > 0)
                .unwrap_or(DEFAULT_INTERVAL_SECONDS),
            max_value: self.max_value,
            min_value: self.min_value,
            state: self
                .state
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_STATE.to_string()),
            id_user_created: self.id_user_created.filter(|&id| id != 0),
            created_at: timestamp_or(self.created_at, "created_at", &now)?,
            id_user_modified: self.id_user_modified.filter(|&id| id != 0),
            modified_at: timestamp_or(self.modified_at, "modified_at", &now)?,
        };

        Ok((serial, config))
    }
}

/// Same notion of "present" as the web frontend: null, false, 0 and "" are absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Caller timestamp unchanged if it is RFC 3339, `now` if absent or empty.
fn timestamp_or(value: Option<String>, field: &str, now: &str) -> AppResult<String> {
    match value.filter(|s| !s.is_empty()) {
        None => Ok(now.to_string()),
        Some(ts) => {
            DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| AppError::InvalidBody(format!("{field}: {e}")))?;
            Ok(ts)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateSensorConfigResponse {
    pub success: bool,
    pub message: String,
    pub serial: SensorSerial,
    /// `humidity` or `light`
    pub sensor_type: String,
    /// MQTT topic the configuration was published on
    pub topic: String,
    pub config: SensorConfig,
}
