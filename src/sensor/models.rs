use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

pub const DEFAULT_INTERVAL_SECONDS: u32 = 20;
pub const DEFAULT_STATE: &str = "active";

/// Sensor classes a device can be configured for, keyed by their hardware serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SensorSerial {
    /// Soil humidity sensor
    #[serde(rename = "0x001C")]
    Humidity,
    /// Ambient light sensor
    #[serde(rename = "0x001D")]
    Light,
}

impl SensorSerial {
    pub const ALL: [Self; 2] = [Self::Humidity, Self::Light];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Humidity => "0x001C",
            Self::Light => "0x001D",
        }
    }

    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Humidity => "humidity",
            Self::Light => "light",
        }
    }

    /// Topic the device firmware subscribes to for configuration pushes.
    #[must_use]
    pub fn config_topic(self) -> String {
        format!("ong/sensor/{}/config", self.as_str())
    }
}

impl fmt::Display for SensorSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorSerial {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|serial| serial.as_str() == s)
            .ok_or(AppError::InvalidSerial)
    }
}

/// Canonical configuration record pushed to a device.
///
/// Field order matches the payload the firmware parses.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorConfig {
    pub id_sensor: i64,
    pub interval_seconds: u32,
    pub max_value: Option<f64>,
    pub min_value: Option<f64>,
    pub state: String,
    pub id_user_created: Option<i64>,
    /// RFC 3339, as sent by the caller or the request time in UTC millis
    pub created_at: String,
    pub id_user_modified: Option<i64>,
    pub modified_at: String,
}

impl SensorConfig {
    /// Serialize to the JSON payload published on the config topic.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
