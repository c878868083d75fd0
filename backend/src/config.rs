use std::env;

/// JWT signing and validation settings. Issued tokens and the request
/// extractor both receive this explicitly; nothing reads the environment
/// after startup.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Seeded admin account so role-gated routes work on a fresh database.
    pub admin_email: String,
    pub admin_password: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address: optional("BIND_ADDRESS", "0.0.0.0:8080"),
            admin_email: optional("ADMIN_EMAIL", "admin@sensorhub.local"),
            admin_password: optional("ADMIN_PASSWORD", "Admin123!"),
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                issuer: optional("JWT_ISSUER", "SensorHub"),
                audience: optional("JWT_AUDIENCE", "SensorHub"),
                expiration_hours: optional("JWT_EXPIRATION_HOURS", "1")
                    .parse()
                    .map_err(|_| "JWT_EXPIRATION_HOURS must be an integer".to_string())?,
            },
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("Missing required env var: {}", key))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_returns_default_when_unset() {
        assert_eq!(optional("SENSORHUB_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn test_required_reports_missing_key() {
        let err = required("SENSORHUB_TEST_MISSING_VAR").unwrap_err();
        assert!(err.contains("SENSORHUB_TEST_MISSING_VAR"));
    }
}
