mod handlers;
mod types;

pub use handlers::{method_not_allowed, update_sensor_config};
pub use types::{UpdateSensorConfigRequest, UpdateSensorConfigResponse};

// Re-export utoipa path struct for OpenAPI documentation
pub use handlers::__path_update_sensor_config;
