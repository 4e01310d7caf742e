use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUser {
    pub id: Uuid,
    pub updated_fields: Vec<String>,
}
