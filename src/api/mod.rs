//! API handlers for the lending REST endpoints

pub mod books;
pub mod borrowing;
pub mod health;
pub mod members;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{error::AppError, AppState};

/// JSON body that has been deserialized and passed its `validator` rules.
/// Malformed bodies and rule violations are both rejected with 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        // Members
        .route("/members", get(members::list_members))
        .route("/members", post(members::create_member))
        .route("/members/:id", get(members::get_member))
        .route("/members/:id", put(members::update_member))
        .route("/members/:id", delete(members::delete_member))
        // Borrowing
        .route("/borrow", post(borrowing::borrow_book))
        .route("/borrow", delete(borrowing::return_book))
        .route("/borrow/books/member/:member_name", get(borrowing::books_borrowed_by_member))
        .route("/borrow/books/distinct-names", get(borrowing::distinct_borrowed_titles))
        .route(
            "/borrow/books/distinct-names-with-count",
            get(borrowing::borrow_count_by_title),
        )
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
