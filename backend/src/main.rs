use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

mod api;
mod config;
mod db;
mod models;
mod schema;
mod services;

use config::AppConfig;
use models::{Role, User};

#[get("/")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "SensorHub Backend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ensures an admin account exists so role-gated routes are reachable on a
/// fresh database. The password comes from configuration; change it outside
/// development.
fn seed_admin_user(pool: &db::DbPool, email: &str, password: &str) {
    use schema::users;

    let mut conn = pool.get().expect("Failed to get database connection");

    let existing = users::table
        .filter(users::email.eq(email))
        .select(users::id)
        .first::<Uuid>(&mut conn)
        .optional()
        .expect("Failed to query users table");
    if existing.is_some() {
        return;
    }

    let hashed = services::auth::hash_password(password).expect("Failed to hash admin password");
    let admin = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hashed,
        role: Role::Admin.as_str().to_string(),
        created_at: Utc::now().naive_utc(),
    };

    match diesel::insert_into(users::table)
        .values(&admin)
        .execute(&mut conn)
    {
        Ok(_) => log::info!("Seeded default admin account {}", email),
        Err(e) => log::error!("Failed to seed admin account: {}", e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // DB Pool initialization
    let pool = db::init_pool(&app_config.database_url);
    seed_admin_user(&pool, &app_config.admin_email, &app_config.admin_password);

    log::info!(
        "Starting SensorHub Backend at http://{}",
        app_config.bind_address
    );

    let bind_address = app_config.bind_address.clone();
    let jwt_config = app_config.jwt.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_config.clone()))
            .service(health_check)
            .configure(api::config)
    })
    .bind(bind_address)?
    .run()
    .await
}
