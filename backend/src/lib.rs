//! SensorHub Backend Library
//!
//! This library provides the core functionality for the SensorHub telemetry
//! service, including:
//! - Device registration and API-key provisioning
//! - Reading ingestion with synchronous alert-rule evaluation
//! - Threshold-based alert rules and alert records
//! - User authentication (JWT) and role management

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod services;
