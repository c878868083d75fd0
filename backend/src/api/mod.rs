use actix_web::web;

pub mod alert_rules;
pub mod alerts;
pub mod auth;
pub mod devices;
pub mod readings;
pub mod validation;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Auth routes (register/login public, role assignment admin-gated)
    cfg.service(
        web::scope("/api/v1/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::assign_role),
    );

    // Device management (admin) plus per-device reading queries
    cfg.service(
        web::scope("/api/v1/devices")
            .service(devices::create_device)
            .service(devices::list_devices)
            .service(devices::generate_api_key)
            .service(readings::list_readings),
    );

    // Ingestion authenticates with the device key header, not a bearer token
    cfg.service(web::scope("/api/v1/readings").service(readings::ingest_reading));

    // Alert rule management (admin)
    cfg.service(
        web::scope("/api/v1/alert-rules")
            .service(alert_rules::create_alert_rule)
            .service(alert_rules::list_alert_rules),
    );

    // Alert queries (any authenticated user)
    cfg.service(web::scope("/api/v1/alerts").service(alerts::list_alerts));
}
