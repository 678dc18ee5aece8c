//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowing, health, members};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "0.1.0",
        description = "Library lending tracker REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        // Borrowing
        borrowing::borrow_book,
        borrowing::return_book,
        borrowing::books_borrowed_by_member,
        borrowing::distinct_borrowed_titles,
        borrowing::borrow_count_by_title,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::member::Member,
            crate::models::member::MemberRequest,
            crate::models::borrowing::BorrowRequest,
            crate::models::borrowing::BorrowingDetails,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "members", description = "Member management"),
        (name = "borrowing", description = "Borrowing and returning books")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
