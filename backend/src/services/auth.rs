use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::models::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web};
use chrono::{Duration, NaiveDateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use std::future::{Ready, ready};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,        // Subject (User ID)
    pub email: String,
    pub roles: Vec<String>, // Role names, frozen at issuance
    pub iss: String,
    pub aud: String,
    pub exp: usize,         // Expiration
    pub iat: usize,
    pub jti: String,        // Unique token id, distinguishes same-instant tokens
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| Role::from_str(r) == Some(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Readings and alerts are visible to any authenticated user role.
    pub fn can_view_telemetry(&self) -> bool {
        self.has_role(Role::Admin) || self.has_role(Role::User)
    }
}

impl FromRequest for Claims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<JwtConfig>>() {
            Some(c) => c,
            None => {
                log::error!("JwtConfig is not registered in app data");
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Server misconfiguration",
                )));
            }
        };

        let auth_header = match req.headers().get("Authorization") {
            Some(h) => h,
            None => return ready(Err(ErrorUnauthorized("Authentication required"))),
        };

        let token_str = match auth_header.to_str() {
            Ok(s) => s.replace("Bearer ", ""),
            Err(_) => return ready(Err(ErrorUnauthorized("Authentication required"))),
        };

        // Every rejection collapses to the same 401; the reason stays in the log.
        match decode_jwt(config, &token_str) {
            Ok(claims) => ready(Ok(claims)),
            Err(e) => {
                log::debug!("Rejected bearer token: {}", e);
                ready(Err(ErrorUnauthorized("Authentication required")))
            }
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Issues a signed token for the user. Returns the token plus its absolute
/// expiry so callers can report both to the client.
pub fn create_jwt(
    config: &JwtConfig,
    user_id: Uuid,
    email: &str,
    roles: &[Role],
) -> Result<(String, NaiveDateTime), String> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| e.to_string())?;

    Ok((token, expires_at.naive_utc()))
}

/// Checks signature, issuer, audience, and expiry.
pub fn decode_jwt(
    config: &JwtConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: "SensorHub".to_string(),
            audience: "SensorHub".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn test_hash_password_returns_valid_hash() {
        let password = "my_secure_password";
        let result = hash_password(password);

        assert!(result.is_ok());
        let hash = result.unwrap();
        assert!(!hash.is_empty());
        assert!(hash.starts_with("$argon2")); // Argon2 hash format
    }

    #[test]
    fn test_hash_password_produces_different_hashes_for_same_password() {
        let password = "my_secure_password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "my_secure_password";
        let hash = hash_password(password).unwrap();

        let result = verify_password(password, &hash);
        assert!(result.is_ok());
        assert!(result.unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = "my_secure_password";
        let wrong_password = "wrong_password";
        let hash = hash_password(password).unwrap();

        let result = verify_password(wrong_password, &hash);
        assert!(result.is_ok());
        assert!(!result.unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash");
        assert!(result.is_err());
    }

    #[test]
    fn test_create_jwt_round_trip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let (token, expiration) =
            create_jwt(&config, user_id, "user@example.com", &[Role::User]).unwrap();

        // JWT has 3 parts separated by dots
        assert_eq!(token.split('.').count(), 3);

        let claims = decode_jwt(&config, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.roles, vec!["User".to_string()]);
        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(expiration.and_utc().timestamp() as usize, claims.exp);
    }

    #[test]
    fn test_jwt_expiration_is_in_future() {
        let config = test_config();
        let (token, _) =
            create_jwt(&config, Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();
        let claims = decode_jwt(&config, &token).unwrap();

        let now = Utc::now().timestamp() as usize;
        assert!(claims.exp > now);
        // Should be approximately one hour in the future
        assert!(claims.exp <= now + 3600 + 1);
    }

    #[test]
    fn test_expired_jwt_is_rejected() {
        let config = test_config();

        // Build an already-expired token, beyond the default 60s leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            roles: vec!["User".to_string()],
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            exp: (now - 300) as usize,
            iat: (now - 600) as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(decode_jwt(&config, &token).is_err());
    }

    #[test]
    fn test_jwt_with_wrong_secret_is_rejected() {
        let config = test_config();
        let mut other = test_config();
        other.secret = "a-completely-different-signing-secret".to_string();

        let (token, _) = create_jwt(&config, Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();
        assert!(decode_jwt(&other, &token).is_err());
    }

    #[test]
    fn test_jwt_with_wrong_issuer_or_audience_is_rejected() {
        let config = test_config();
        let (token, _) = create_jwt(&config, Uuid::new_v4(), "a@b.c", &[Role::User]).unwrap();

        let mut wrong_issuer = test_config();
        wrong_issuer.issuer = "SomeoneElse".to_string();
        assert!(decode_jwt(&wrong_issuer, &token).is_err());

        let mut wrong_audience = test_config();
        wrong_audience.audience = "SomeoneElse".to_string();
        assert!(decode_jwt(&wrong_audience, &token).is_err());
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let (token1, _) = create_jwt(&config, user_id, "a@b.c", &[Role::User]).unwrap();
        let (token2, _) = create_jwt(&config, user_id, "a@b.c", &[Role::User]).unwrap();

        let jti1 = decode_jwt(&config, &token1).unwrap().jti;
        let jti2 = decode_jwt(&config, &token2).unwrap().jti;
        assert_ne!(jti1, jti2);
    }

    #[test]
    fn test_role_predicates() {
        let config = test_config();
        let (token, _) =
            create_jwt(&config, Uuid::new_v4(), "admin@b.c", &[Role::Admin]).unwrap();
        let claims = decode_jwt(&config, &token).unwrap();

        assert!(claims.is_admin());
        assert!(claims.has_role(Role::Admin));
        assert!(!claims.has_role(Role::User));
        assert!(claims.can_view_telemetry());

        let (token, _) = create_jwt(&config, Uuid::new_v4(), "u@b.c", &[Role::User]).unwrap();
        let claims = decode_jwt(&config, &token).unwrap();
        assert!(!claims.is_admin());
        assert!(claims.can_view_telemetry());
    }

    #[test]
    fn test_unknown_role_strings_grant_nothing() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            roles: vec!["SuperAdmin".to_string(), "root".to_string()],
            iss: "SensorHub".to_string(),
            aud: "SensorHub".to_string(),
            exp: 0,
            iat: 0,
            jti: Uuid::new_v4().to_string(),
        };
        assert!(!claims.is_admin());
        assert!(!claims.can_view_telemetry());
    }
}
