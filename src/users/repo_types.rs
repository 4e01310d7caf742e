use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub image: Option<String>,
    pub has_membership: Option<i16>,
    pub qr_code: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub gender: Option<String>,
    pub password_hash: String,
    pub image: Option<String>,
    pub has_membership: Option<i16>,
    pub qr_code: Option<String>,
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub image: Option<Option<String>>,
    pub has_membership: Option<Option<i16>>,
    pub qr_code: Option<Option<String>>,
}
