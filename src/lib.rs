//! Sensor config API - republishes sensor configuration updates to devices over MQTT
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod error;
pub mod mqtt;
pub mod routes;
pub mod sensor;
