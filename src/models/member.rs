//! Member model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

static NOT_BLANK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S").expect("valid regex"));

/// Library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    /// Enrollment date, set once on creation
    pub member_date: DateTime<Utc>,
}

/// Create / update member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemberRequest {
    #[validate(
        regex(path = *NOT_BLANK_RE, message = "Name is required"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
}
