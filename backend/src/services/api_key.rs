use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use diesel::prelude::*;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Device;
use crate::schema::devices;

/// Identity of a device that presented a valid API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePrincipal {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug)]
pub enum DeviceAuthError {
    /// No active device matches the presented key. Carries no detail on
    /// purpose: "wrong key" and "no such device" must look identical.
    InvalidKey,
    Database(diesel::result::Error),
}

impl std::fmt::Display for DeviceAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceAuthError::InvalidKey => write!(f, "Invalid API key"),
            DeviceAuthError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

/// Generates a device API key: 256 bits from a CSPRNG, URL-safe Base64
/// without padding so it survives headers unescaped.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of the key. Only this is ever persisted.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash-and-compare. Hex case is normalized since stored hashes may have
/// been written by tooling with either casing.
pub fn validate_api_key(provided_key: &str, stored_hash: &str) -> bool {
    hash_api_key(provided_key).eq_ignore_ascii_case(stored_hash)
}

/// Looks up the active device owning the presented key. Read-only.
pub fn authenticate_device(
    conn: &mut PgConnection,
    raw_key: &str,
) -> Result<DevicePrincipal, DeviceAuthError> {
    if raw_key.trim().is_empty() {
        return Err(DeviceAuthError::InvalidKey);
    }

    let key_hash = hash_api_key(raw_key);
    let device = devices::table
        .filter(devices::api_key_hash.eq(&key_hash))
        .filter(devices::is_active.eq(true))
        .first::<Device>(conn)
        .optional()
        .map_err(DeviceAuthError::Database)?;

    match device {
        Some(d) => Ok(DevicePrincipal {
            id: d.id,
            name: d.name,
        }),
        None => Err(DeviceAuthError::InvalidKey),
    }
}
