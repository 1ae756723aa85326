mod models;

pub use models::{SensorConfig, SensorSerial, DEFAULT_INTERVAL_SECONDS, DEFAULT_STATE};
