use crate::{
    api::validation,
    db::DbPool,
    models::Alert,
    schema::alerts,
    services::auth::Claims,
};
use actix_web::{HttpResponse, Responder, get, web};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsQuery {
    pub device_id: Option<Uuid>,
    pub acknowledged: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: Uuid,
    pub alert_rule_id: Uuid,
    pub device_id: Uuid,
    pub value: f64,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub is_acknowledged: bool,
}

impl From<Alert> for AlertResponse {
    fn from(a: Alert) -> Self {
        AlertResponse {
            id: a.id,
            alert_rule_id: a.alert_rule_id,
            device_id: a.device_id,
            value: a.value,
            message: a.message,
            created_at: a.created_at,
            is_acknowledged: a.is_acknowledged,
        }
    }
}

/// List alerts, newest first, optionally filtered by device and
/// acknowledged state
#[get("")]
pub async fn list_alerts(
    pool: web::Data<DbPool>,
    claims: Claims,
    query: web::Query<AlertsQuery>,
) -> impl Responder {
    if !claims.can_view_telemetry() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Insufficient role"}));
    }

    let limit = query.limit.unwrap_or(validation::DEFAULT_LIMIT);
    if let Err(reason) = validation::validate_limit(limit) {
        return HttpResponse::BadRequest().json(serde_json::json!({"message": reason}));
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let mut db_query = alerts::table.into_boxed();
    if let Some(device_id) = query.device_id {
        db_query = db_query.filter(alerts::device_id.eq(device_id));
    }
    if let Some(acknowledged) = query.acknowledged {
        db_query = db_query.filter(alerts::is_acknowledged.eq(acknowledged));
    }

    let result: Vec<Alert> = match db_query
        .order(alerts::created_at.desc())
        .limit(limit)
        .load(&mut conn)
    {
        Ok(a) => a,
        Err(_) => return HttpResponse::InternalServerError().body("Error fetching alerts"),
    };

    let response: Vec<AlertResponse> = result.into_iter().map(AlertResponse::from).collect();
    HttpResponse::Ok().json(response)
}
