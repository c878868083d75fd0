use crate::{
    db::DbPool,
    models::Device,
    schema::devices,
    services::{api_key, auth::Claims},
};
use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_LOCATION_LEN: usize = 200;

#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub location: Option<String>,
}

/// Public device representation. The API key never appears here, not even
/// hashed; only its presence is exposed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub has_api_key: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl From<Device> for DeviceResponse {
    fn from(d: Device) -> Self {
        DeviceResponse {
            id: d.id,
            name: d.name,
            location: d.location,
            has_api_key: d.api_key_hash.is_some(),
            is_active: d.is_active,
            created_at: d.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub api_key: String,
    pub message: String,
}

/// Register a new device
#[post("")]
pub async fn create_device(
    pool: web::Data<DbPool>,
    claims: Claims,
    body: web::Json<CreateDeviceRequest>,
) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    if body.name.trim().is_empty() || body.name.len() > MAX_NAME_LEN {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("name must be 1 to {} characters", MAX_NAME_LEN)
        }));
    }
    if let Some(ref location) = body.location {
        if location.len() > MAX_LOCATION_LEN {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": format!("location must be at most {} characters", MAX_LOCATION_LEN)
            }));
        }
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let device = Device {
        id: Uuid::new_v4(),
        name: body.name.clone(),
        location: body.location.clone(),
        api_key_hash: None,
        is_active: true,
        created_at: Utc::now().naive_utc(),
    };

    match diesel::insert_into(devices::table)
        .values(&device)
        .get_result::<Device>(&mut conn)
    {
        Ok(d) => HttpResponse::Created().json(DeviceResponse::from(d)),
        Err(e) => {
            log::error!("Failed to create device: {}", e);
            HttpResponse::InternalServerError().body("Failed to create device")
        }
    }
}

/// List all registered devices, newest first
#[get("")]
pub async fn list_devices(pool: web::Data<DbPool>, claims: Claims) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let devices: Vec<Device> = match devices::table
        .order(devices::created_at.desc())
        .load(&mut conn)
    {
        Ok(d) => d,
        Err(_) => return HttpResponse::InternalServerError().body("Error fetching devices"),
    };

    let response: Vec<DeviceResponse> = devices.into_iter().map(DeviceResponse::from).collect();
    HttpResponse::Ok().json(response)
}

/// Issue a fresh API key for a device. The raw key appears in this response
/// and nowhere else; only its hash is stored. Re-issuing replaces the hash,
/// which revokes the previous key.
#[post("/{device_id}/api-key")]
pub async fn generate_api_key(
    pool: web::Data<DbPool>,
    claims: Claims,
    path: web::Path<Uuid>,
) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    let device_id = path.into_inner();
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let api_key = api_key::generate_api_key();
    let key_hash = api_key::hash_api_key(&api_key);

    let updated = diesel::update(devices::table.filter(devices::id.eq(device_id)))
        .set(devices::api_key_hash.eq(&key_hash))
        .execute(&mut conn);

    match updated {
        Ok(0) => HttpResponse::NotFound().json(serde_json::json!({"message": "Device not found"})),
        Ok(_) => HttpResponse::Ok().json(ApiKeyResponse {
            api_key,
            message: "Store this key securely. It won't be shown again.".to_string(),
        }),
        Err(e) => {
            log::error!("Failed to store API key hash for {}: {}", device_id, e);
            HttpResponse::InternalServerError().body("Failed to generate API key")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_device_request_deserialization() {
        let json = r#"{"name": "Greenhouse sensor", "location": "North wall"}"#;
        let request: CreateDeviceRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.name, "Greenhouse sensor");
        assert_eq!(request.location, Some("North wall".to_string()));
    }

    #[test]
    fn test_create_device_request_location_is_optional() {
        let json = r#"{"name": "Bare sensor"}"#;
        let request: CreateDeviceRequest = serde_json::from_str(json).unwrap();

        assert!(request.location.is_none());
    }

    #[test]
    fn test_device_response_hides_key_hash() {
        let device = Device {
            id: Uuid::new_v4(),
            name: "d".to_string(),
            location: None,
            api_key_hash: Some("deadbeef".to_string()),
            is_active: true,
            created_at: Utc::now().naive_utc(),
        };

        let response = DeviceResponse::from(device);
        assert!(response.has_api_key);

        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("hasApiKey"));
    }
}
