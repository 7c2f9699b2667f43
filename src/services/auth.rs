//! Admin credentials and bearer-token verification.
//!
//! Admins log in locally (argon2 password hash, HS256 token carrying a role).
//! Customers authenticate with the external identity provider; we only verify
//! the HS256 tokens it issues with the shared secret.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::domain::AdminUser;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Admin role required")]
    Forbidden,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims we rely on from identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken { pub token: String, pub expires_at: DateTime<Utc> }

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Signs and checks tokens for both identity systems.
#[derive(Clone)]
pub struct TokenService {
    admin_secret: SecretString,
    identity_secret: SecretString,
    admin_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            admin_secret: config.admin_jwt_secret.clone(),
            identity_secret: config.identity_jwt_secret.clone(),
            admin_ttl: Duration::hours(config.admin_token_ttl_hours),
        }
    }

    pub fn issue_admin_token(&self, admin: &AdminUser) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.admin_ttl;
        let claims = AdminClaims {
            sub: admin.id.to_string(), email: admin.email.clone(), role: ADMIN_ROLE.to_string(),
            iat: now.timestamp(), exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.admin_secret.expose_secret().as_bytes()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies signature and expiry, then requires the admin role.
    pub fn verify_admin(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let claims = decode::<AdminClaims>(token, &DecodingKey::from_secret(self.admin_secret.expose_secret().as_bytes()), &Validation::default())?.claims;
        if claims.role != ADMIN_ROLE { return Err(AuthError::Forbidden); }
        Ok(claims)
    }

    pub fn verify_customer(&self, token: &str) -> Result<CustomerClaims, AuthError> {
        let data = decode::<CustomerClaims>(token, &DecodingKey::from_secret(self.identity_secret.expose_secret().as_bytes()), &Validation::default())?;
        Ok(data.claims)
    }
}
