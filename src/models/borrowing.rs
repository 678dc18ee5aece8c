//! Borrowing (active loan) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{book::Book, member::Member};

/// Borrowing row: one member currently holds one copy of one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Borrowing {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
}

/// Borrowing with the book and member it joins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i64,
    pub book: Book,
    pub member: Member,
}

/// Borrow / return request body
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub book_id: i64,
    pub member_id: i64,
}
