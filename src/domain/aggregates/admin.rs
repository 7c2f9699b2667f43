//! Store-operator accounts. Customers live with the identity provider and have no record here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn new(email: &str, password_hash: String) -> Self {
        Self { id: Uuid::now_v7(), email: normalize_email(email), password_hash, created_at: Utc::now() }
    }
}

pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
