//! Borrow / return endpoints and loan queries

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::Book,
        borrowing::{BorrowRequest, BorrowingDetails},
    },
};

use super::ValidatedJson;

/// Borrow a book on behalf of a member
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "borrowing",
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book borrowed", body = BorrowingDetails),
        (status = 404, description = "Member or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Out of stock, borrow limit reached or already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<BorrowRequest>,
) -> AppResult<Json<BorrowingDetails>> {
    let borrowing = state
        .services
        .borrowing
        .borrow_book(request.book_id, request.member_id)
        .await?;
    Ok(Json(borrowing))
}

/// Return a borrowed book
#[utoipa::path(
    delete,
    path = "/borrow",
    tag = "borrowing",
    request_body = BorrowRequest,
    responses(
        (status = 204, description = "Book returned"),
        (status = 404, description = "Member or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<BorrowRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .borrowing
        .return_book(request.book_id, request.member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Books currently borrowed by a member, looked up by name
#[utoipa::path(
    get,
    path = "/borrow/books/member/{member_name}",
    tag = "borrowing",
    params(("member_name" = String, Path, description = "Member name")),
    responses(
        (status = 200, description = "Borrowed books", body = Vec<Book>),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn books_borrowed_by_member(
    State(state): State<crate::AppState>,
    Path(member_name): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .services
        .borrowing
        .books_borrowed_by_member_name(&member_name)
        .await?;
    Ok(Json(books))
}

/// Distinct titles of borrowed books
#[utoipa::path(
    get,
    path = "/borrow/books/distinct-names",
    tag = "borrowing",
    responses(
        (status = 200, description = "Borrowed titles", body = Vec<String>)
    )
)]
pub async fn distinct_borrowed_titles(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    let titles = state.services.borrowing.distinct_borrowed_titles().await?;
    Ok(Json(titles))
}

/// Borrowed titles with the number of active borrowings for each
#[utoipa::path(
    get,
    path = "/borrow/books/distinct-names-with-count",
    tag = "borrowing",
    responses(
        (status = 200, description = "Title to borrow count", body = BTreeMap<String, i64>)
    )
)]
pub async fn borrow_count_by_title(
    State(state): State<crate::AppState>,
) -> AppResult<Json<BTreeMap<String, i64>>> {
    let counts = state.services.borrowing.borrow_count_by_title().await?;
    Ok(Json(counts))
}
