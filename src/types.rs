use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub uuid: Uuid,
    pub handle: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub likes_count: u32,
    pub replies_count: u32,
    pub reposts_count: u32,
    pub replies: Vec<ReplyRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRecord {
    pub uuid: Uuid,
    pub reply_to_activity_uuid: Uuid,
    pub handle: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: u32,
    pub replies_count: u32,
    pub reposts_count: u32,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub success: bool,
    pub ver: u32,
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // caller identifier
    pub exp: i64,    // expiration time
}
