use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{Alert, Reading};
use crate::schema::readings;
use crate::services::alerts;
use crate::services::api_key::{self, DeviceAuthError};

pub const TEMPERATURE_MIN: f64 = -100.0;
pub const TEMPERATURE_MAX: f64 = 100.0;
pub const HUMIDITY_MIN: f64 = 0.0;
pub const HUMIDITY_MAX: f64 = 100.0;

#[derive(Debug, Clone, Deserialize)]
pub struct IngestReading {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum IngestError {
    /// Missing, blank, or unknown device key. One opaque outcome.
    Unauthorized,
    /// Payload outside accepted metric ranges.
    Validation(String),
    /// The reading itself could not be stored.
    Persistence(String),
    /// The reading was stored but the alert batch failed. The reading is
    /// the source of truth and is not rolled back.
    AlertPersistence(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Unauthorized => write!(f, "Invalid device credentials"),
            IngestError::Validation(reason) => write!(f, "Validation failed: {}", reason),
            IngestError::Persistence(e) => write!(f, "Failed to store reading: {}", e),
            IngestError::AlertPersistence(e) => write!(f, "Failed to store alerts: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub alerts: Vec<Alert>,
}

/// One ingestion request, start to finish: authenticate the device key,
/// validate the payload, store the reading, then evaluate alert rules.
/// Owns no transport concerns, so tests can drive it directly.
pub struct IngestionPipeline {
    pool: DbPool,
}

impl IngestionPipeline {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The reading write and the alert batch are separate transactions: an
    /// alert failure reports an error while the stored reading stays put.
    pub fn ingest(
        &self,
        raw_key: Option<&str>,
        request: &IngestReading,
    ) -> Result<IngestOutcome, IngestError> {
        // No credential offered and blank credential both end unauthorized
        // here; only the log distinguishes them.
        let key = match raw_key {
            Some(k) => k,
            None => {
                log::debug!("Ingestion request without device key header");
                return Err(IngestError::Unauthorized);
            }
        };

        let mut conn = self
            .pool
            .get()
            .map_err(|e| IngestError::Persistence(e.to_string()))?;

        let principal = api_key::authenticate_device(&mut conn, key).map_err(|e| match e {
            DeviceAuthError::InvalidKey => IngestError::Unauthorized,
            DeviceAuthError::Database(e) => IngestError::Persistence(e.to_string()),
        })?;

        validate_metrics(request).map_err(IngestError::Validation)?;

        let reading = Reading {
            id: Uuid::new_v4(),
            device_id: principal.id,
            temperature: request.temperature,
            humidity: request.humidity,
            timestamp: request.timestamp.unwrap_or_else(|| Utc::now().naive_utc()),
        };

        let reading: Reading = diesel::insert_into(readings::table)
            .values(&reading)
            .get_result(&mut conn)
            .map_err(|e| IngestError::Persistence(e.to_string()))?;

        let alerts =
            alerts::evaluate_and_create_alerts(&mut conn, &reading).map_err(|e| {
                log::error!(
                    "Alert generation failed for reading {} (reading kept): {}",
                    reading.id,
                    e
                );
                IngestError::AlertPersistence(e.to_string())
            })?;

        Ok(IngestOutcome { reading, alerts })
    }
}

/// Range checks from the ingestion contract. Pure, so it is testable
/// without a store. Non-finite values are rejected outright.
pub fn validate_metrics(request: &IngestReading) -> Result<(), String> {
    if !request.temperature.is_finite()
        || request.temperature < TEMPERATURE_MIN
        || request.temperature > TEMPERATURE_MAX
    {
        return Err(format!(
            "temperature must be between {} and {}",
            TEMPERATURE_MIN, TEMPERATURE_MAX
        ));
    }
    if !request.humidity.is_finite()
        || request.humidity < HUMIDITY_MIN
        || request.humidity > HUMIDITY_MAX
    {
        return Err(format!(
            "humidity must be between {} and {}",
            HUMIDITY_MIN, HUMIDITY_MAX
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(temperature: f64, humidity: f64) -> IngestReading {
        IngestReading {
            temperature,
            humidity,
            timestamp: None,
        }
    }

    #[test]
    fn test_validate_metrics_accepts_in_range_values() {
        assert!(validate_metrics(&payload(21.5, 45.0)).is_ok());
        assert!(validate_metrics(&payload(-100.0, 0.0)).is_ok());
        assert!(validate_metrics(&payload(100.0, 100.0)).is_ok());
    }

    #[test]
    fn test_validate_metrics_rejects_out_of_range_temperature() {
        let err = validate_metrics(&payload(-100.1, 50.0)).unwrap_err();
        assert!(err.contains("temperature"));
        assert!(validate_metrics(&payload(100.1, 50.0)).is_err());
    }

    #[test]
    fn test_validate_metrics_rejects_out_of_range_humidity() {
        let err = validate_metrics(&payload(20.0, -0.1)).unwrap_err();
        assert!(err.contains("humidity"));
        assert!(validate_metrics(&payload(20.0, 100.1)).is_err());
    }

    #[test]
    fn test_validate_metrics_rejects_non_finite_values() {
        assert!(validate_metrics(&payload(f64::NAN, 50.0)).is_err());
        assert!(validate_metrics(&payload(f64::INFINITY, 50.0)).is_err());
        assert!(validate_metrics(&payload(20.0, f64::NAN)).is_err());
        assert!(validate_metrics(&payload(20.0, f64::NEG_INFINITY)).is_err());
    }

    #[test]
    fn test_ingest_request_deserialization() {
        let json = r#"{"temperature": 21.5, "humidity": 60.0}"#;
        let request: IngestReading = serde_json::from_str(json).unwrap();
        assert_eq!(request.temperature, 21.5);
        assert_eq!(request.humidity, 60.0);
        assert!(request.timestamp.is_none());
    }

    #[test]
    fn test_ingest_request_deserialization_with_timestamp() {
        let json = r#"{"temperature": 0.0, "humidity": 0.0, "timestamp": "2026-01-29T17:58:45"}"#;
        let request: IngestReading = serde_json::from_str(json).unwrap();
        let ts = request.timestamp.unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2026-01-29");
    }
}
