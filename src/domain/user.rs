use chrono::{DateTime, Utc};

use super::order::Role;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
}
