use crate::{
    db::DbPool,
    models::{AlertRule, ComparisonOperator, MetricType},
    schema::{alert_rules, devices},
    services::auth::Claims,
};
use actix_web::{HttpResponse, Responder, get, post, web};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRuleRequest {
    pub device_id: Uuid,
    pub metric_type: String,
    pub operator: String,
    pub threshold: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleResponse {
    pub id: Uuid,
    pub device_id: Uuid,
    pub metric_type: String,
    pub operator: String,
    pub threshold: f64,
    pub is_active: bool,
}

impl From<AlertRule> for AlertRuleResponse {
    fn from(r: AlertRule) -> Self {
        AlertRuleResponse {
            id: r.id,
            device_id: r.device_id,
            metric_type: r.metric_type,
            operator: r.operator,
            threshold: r.threshold,
            is_active: r.is_active,
        }
    }
}

/// Create a threshold rule for one device metric
#[post("")]
pub async fn create_alert_rule(
    pool: web::Data<DbPool>,
    claims: Claims,
    body: web::Json<CreateAlertRuleRequest>,
) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    // Reject unknown names up front; rules are stored in canonical form so
    // evaluation never sees a string it can't parse.
    let metric = match MetricType::from_str(&body.metric_type) {
        Some(m) => m,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "metricType must be 'Temperature' or 'Humidity'"
            }));
        }
    };
    let operator = match ComparisonOperator::from_str(&body.operator) {
        Some(o) => o,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Invalid operator"
            }));
        }
    };
    if !body.threshold.is_finite() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"message": "threshold must be a finite number"}));
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let device_exists = devices::table
        .filter(devices::id.eq(body.device_id))
        .select(devices::id)
        .first::<Uuid>(&mut conn)
        .is_ok();

    if !device_exists {
        return HttpResponse::NotFound().json(serde_json::json!({"message": "Device not found"}));
    }

    let rule = AlertRule {
        id: Uuid::new_v4(),
        device_id: body.device_id,
        metric_type: metric.as_str().to_string(),
        operator: operator.as_str().to_string(),
        threshold: body.threshold,
        is_active: true,
    };

    match diesel::insert_into(alert_rules::table)
        .values(&rule)
        .get_result::<AlertRule>(&mut conn)
    {
        Ok(r) => HttpResponse::Created().json(AlertRuleResponse::from(r)),
        Err(e) => {
            log::error!("Failed to create alert rule: {}", e);
            HttpResponse::InternalServerError().body("Failed to create alert rule")
        }
    }
}

/// List all alert rules
#[get("")]
pub async fn list_alert_rules(pool: web::Data<DbPool>, claims: Claims) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let rules: Vec<AlertRule> = match alert_rules::table.load(&mut conn) {
        Ok(r) => r,
        Err(_) => return HttpResponse::InternalServerError().body("Error fetching alert rules"),
    };

    let response: Vec<AlertRuleResponse> =
        rules.into_iter().map(AlertRuleResponse::from).collect();
    HttpResponse::Ok().json(response)
}
