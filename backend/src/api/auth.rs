use crate::{
    config::JwtConfig,
    db::DbPool,
    models::{Role, User},
    schema::users,
    services::auth,
};
use actix_web::{HttpResponse, Responder, post, web};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Registration deliberately has no role field: any role sent by the client
// is dropped during deserialization and new accounts always start as User.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expiration: chrono::NaiveDateTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role: String,
}

#[post("/register")]
pub async fn register(pool: web::Data<DbPool>, item: web::Json<RegisterRequest>) -> impl Responder {
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    if item.email.trim().is_empty() || !item.email.contains('@') {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"message": "Invalid email address"}));
    }
    if item.password.len() < 6 {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"message": "Password must be at least 6 characters"}));
    }

    // Hash password
    let hashed = match auth::hash_password(&item.password) {
        Ok(h) => h,
        Err(_) => return HttpResponse::InternalServerError().body("Error hashing password"),
    };

    let new_user = User {
        id: Uuid::new_v4(),
        email: item.email.clone(),
        password_hash: hashed,
        role: Role::User.as_str().to_string(),
        created_at: Utc::now().naive_utc(),
    };

    // The unique index on email turns a duplicate insert into an error,
    // so a lost race still can't create two accounts.
    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => HttpResponse::Ok()
            .json(serde_json::json!({"message": "User registered successfully"})),
        Err(_) => HttpResponse::BadRequest()
            .json(serde_json::json!({"message": "User already exists"})),
    }
}

#[post("/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    jwt_config: web::Data<JwtConfig>,
    item: web::Json<LoginRequest>,
) -> impl Responder {
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    // Unknown email and wrong password must answer identically.
    let unauthorized = || {
        HttpResponse::Unauthorized()
            .json(serde_json::json!({"message": "Invalid email or password"}))
    };

    let user: User = match users::table
        .filter(users::email.eq(&item.email))
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(_) => return unauthorized(),
    };

    match auth::verify_password(&item.password, &user.password_hash) {
        Ok(true) => {}
        _ => return unauthorized(),
    }

    let roles: Vec<Role> = Role::from_str(&user.role).into_iter().collect();
    match auth::create_jwt(&jwt_config, user.id, &user.email, &roles) {
        Ok((token, expiration)) => HttpResponse::Ok().json(LoginResponse { token, expiration }),
        Err(e) => {
            log::error!("Failed to create token: {}", e);
            HttpResponse::InternalServerError().body("Error creating token")
        }
    }
}

/// Replaces the target user's role. Admin only.
#[post("/assign-role")]
pub async fn assign_role(
    pool: web::Data<DbPool>,
    claims: auth::Claims,
    item: web::Json<AssignRoleRequest>,
) -> impl Responder {
    if !claims.is_admin() {
        return HttpResponse::Forbidden()
            .json(serde_json::json!({"message": "Admin role required"}));
    }

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let role = match Role::from_str(&item.role) {
        Some(r) => r,
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({"message": "Invalid role"}));
        }
    };

    let updated = diesel::update(users::table.filter(users::id.eq(item.user_id)))
        .set(users::role.eq(role.as_str()))
        .execute(&mut conn);

    match updated {
        Ok(0) => HttpResponse::NotFound().json(serde_json::json!({"message": "User not found"})),
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "message": format!("Role '{}' assigned to user", role.as_str())
        })),
        Err(_) => HttpResponse::InternalServerError().body("Failed to assign role"),
    }
}
