pub mod health;
mod rate_limit;
pub mod sensor_config;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use rate_limit::FallbackIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        sensor_config::update_sensor_config,
    ),
    components(
        schemas(
            health::HealthResponse,
            sensor_config::UpdateSensorConfigRequest,
            sensor_config::UpdateSensorConfigResponse,
            crate::sensor::SensorConfig,
            crate::sensor::SensorSerial,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sensors", description = "Sensor configuration updates"),
    ),
    info(
        title = "Sensor Config API",
        description = "Publishes sensor configuration updates to devices over MQTT",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
            "Rate limiting configured"
        );
    }

    let api_routes_base = Router::new().route(
        "/update-sensor-config",
        post(sensor_config::update_sensor_config).fallback(sensor_config::method_not_allowed),
    );

    let api_routes = if config.disable_rate_limiting {
        api_routes_base
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .expect("Failed to create rate limiter");

        api_routes_base.layer(GovernorLayer {
            config: Arc::new(limiter),
        })
    }
    .layer(RequestBodyLimitLayer::new(64 * 1024)); // 64KB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
