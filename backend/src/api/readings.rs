use crate::{
    api::validation,
    db::DbPool,
    models::Reading,
    schema::{devices, readings},
    services::auth::Claims,
    services::ingestion::{IngestError, IngestReading, IngestionPipeline},
};
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the raw device API key on ingestion requests.
pub const DEVICE_KEY_HEADER: &str = "X-Device-Key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub id: Uuid,
    pub device_id: Uuid,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: NaiveDateTime,
}

impl From<Reading> for ReadingResponse {
    fn from(r: Reading) -> Self {
        ReadingResponse {
            id: r.id,
            device_id: r.device_id,
            temperature: r.temperature,
            humidity: r.humidity,
            timestamp: r.timestamp,
        }
    }
}

#[derive(Deserialize)]
pub struct ReadingsQuery {
    pub limit: Option<i64>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

/// Ingest one reading, authenticated solely by the device key header.
#[post("/ingest")]
pub async fn ingest_reading(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    body: web::Json<IngestReading>,
) -> impl Responder {
    let raw_key = req
        .headers()
        .get(DEVICE_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    let pipeline = IngestionPipeline::new(pool.get_ref().clone());
    match pipeline.ingest(raw_key, &body) {
        Ok(outcome) => HttpResponse::Ok().json(ReadingResponse::from(outcome.reading)),
        // All credential problems look the same from outside.
        Err(IngestError::Unauthorized) => HttpResponse::Unauthorized()
            .json(serde_json::json!({"message": "Invalid device credentials"})),
        Err(IngestError::Validation(reason)) => {
            HttpResponse::BadRequest().json(serde_json::json!({"message": reason}))
        }
        Err(e @ (IngestError::Persistence(_) | IngestError::AlertPersistence(_))) => {
            log::error!("Ingestion failed: {}", e);
            HttpResponse::InternalServerError().body("Failed to process reading")
        }
    }
}

/// List a device's readings, newest first
#[get("/{device_id}/readings")]
pub async fn list_readings(
    pool: web::Data<DbPool>,
    claims: Claims,
    path: web::Path<Uuid>,
    query: web::Query<ReadingsQuery>,
) -> impl Responder {
    if !claims.can_view_telemetry() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Insufficient role"}));
    }

    let limit = query.limit.unwrap_or(validation::DEFAULT_LIMIT);
    // Validation short-circuits before any lookup
    if let Err(reason) = validation::validate_query(limit, query.from, query.to) {
        return HttpResponse::BadRequest().json(serde_json::json!({"message": reason}));
    }

    let device_id = path.into_inner();
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let device_exists = devices::table
        .filter(devices::id.eq(device_id))
        .select(devices::id)
        .first::<Uuid>(&mut conn)
        .is_ok();

    if !device_exists {
        return HttpResponse::NotFound().json(serde_json::json!({"message": "Device not found"}));
    }

    let mut db_query = readings::table
        .filter(readings::device_id.eq(device_id))
        .into_boxed();
    if let Some(from) = query.from {
        db_query = db_query.filter(readings::timestamp.ge(from));
    }
    if let Some(to) = query.to {
        db_query = db_query.filter(readings::timestamp.le(to));
    }

    let result: Vec<Reading> = match db_query
        .order(readings::timestamp.desc())
        .limit(limit)
        .load(&mut conn)
    {
        Ok(r) => r,
        Err(_) => return HttpResponse::InternalServerError().body("Error fetching readings"),
    };

    let response: Vec<ReadingResponse> = result.into_iter().map(ReadingResponse::from).collect();
    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_query_all_fields_optional() {
        let query: ReadingsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.limit.is_none());
        assert!(query.from.is_none());
        assert!(query.to.is_none());
    }

    #[test]
    fn test_reading_response_field_names() {
        let reading = Reading {
            id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            temperature: 21.0,
            humidity: 55.0,
            timestamp: chrono::Utc::now().naive_utc(),
        };

        let json = serde_json::to_string(&ReadingResponse::from(reading)).unwrap();
        assert!(json.contains("deviceId"));
        assert!(json.contains("temperature"));
        assert!(json.contains("humidity"));
    }
}
