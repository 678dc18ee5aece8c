//! In-process HTTP tests against the full router

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_server::api::create_router;

fn app() -> Router {
    create_router(common::app_state(3))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("send request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_book(app: &Router, title: &str, author: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({ "title": title, "author": author })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_member(app: &Router, name: &str) -> Value {
    let (status, body) = send(app, Method::POST, "/members", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_book_amount_in_body_is_ignored() {
    let app = app();

    let (status, book) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Clean Code", "author": "Robert Martin", "amount": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["amount"], 1);
    let id = book["id"].as_i64().expect("book id");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{id}"),
        Some(json!({ "title": "Clean Code", "author": "Robert Martin", "amount": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 1);
}

#[tokio::test]
async fn test_overlong_title_is_a_bad_request() {
    let app = app();
    let title = format!("C{}", "a".repeat(300));

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": title, "author": "Robert Martin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["title"].is_array());
}

#[tokio::test]
async fn test_book_crud() {
    let app = app();

    let book = create_book(&app, "Clean Code", "Robert Martin").await;
    assert_eq!(book["amount"], 1);
    let id = book["id"].as_i64().expect("book id");

    let again = create_book(&app, "Clean Code", "Robert Martin").await;
    assert_eq!(again["id"], id);
    assert_eq!(again["amount"], 2);

    let (status, list) = send(&app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/{id}"),
        Some(json!({ "title": "Clean Architecture", "author": "Robert Martin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Clean Architecture");
    assert_eq!(body["amount"], 2);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Book with id {id} not found"));
}

#[tokio::test]
async fn test_book_validation_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "clean code", "author": "robert" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["title"].is_array());
    assert!(body["fields"]["author"].is_array());

    let (status, _) = send(&app, Method::POST, "/books", Some(json!({ "title": "Clean Code" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/members", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["name"][0], "Name is required");
}

#[tokio::test]
async fn test_update_missing_returns_404() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::PUT,
        "/books/77",
        Some(json!({ "title": "Clean Code", "author": "Robert Martin" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/members/77", Some(json!({ "name": "Ghost" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/members/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_crud() {
    let app = app();
    let member = create_member(&app, "John Doe").await;
    let id = member["id"].as_i64().expect("member id");
    assert!(member["memberDate"].is_string());

    let (status, body) = send(&app, Method::PUT, &format!("/members/{id}"), Some(json!({ "name": "John Smith" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "John Smith");
    assert_eq!(body["memberDate"], member["memberDate"]);

    let (status, body) = send(&app, Method::GET, "/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "John Smith");

    let (status, _) = send(&app, Method::DELETE, &format!("/members/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app();
    create_book(&app, "Clean Code", "Robert Martin").await;
    let book = create_book(&app, "Clean Code", "Robert Martin").await;
    let book_id = book["id"].as_i64().expect("book id");
    let john = create_member(&app, "John Doe").await["id"].as_i64().expect("id");
    let jane = create_member(&app, "Jane Roe").await["id"].as_i64().expect("id");
    let max = create_member(&app, "Max Power").await["id"].as_i64().expect("id");

    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "bookId": book_id, "memberId": john })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["amount"], 1);
    assert_eq!(body["member"]["id"], john);

    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "bookId": book_id, "memberId": john })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Book is already borrowed");

    let (status, _) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "bookId": book_id, "memberId": jane })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/borrow",
        Some(json!({ "bookId": book_id, "memberId": max })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Book is no available for borrowing");

    let (status, body) = send(&app, Method::DELETE, &format!("/members/{john}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], format!("Member with id {john} is borrowing a book"));

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{book_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/borrow/books/member/John%20Doe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Clean Code");

    let (status, body) = send(&app, Method::GET, "/borrow/books/distinct-names", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Clean Code"]));

    let (status, body) = send(&app, Method::GET, "/borrow/books/distinct-names-with-count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Clean Code": 2 }));

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/borrow",
        Some(json!({ "bookId": book_id, "memberId": john })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, &format!("/books/{book_id}"), None).await;
    assert_eq!(body["amount"], 1);
}

#[tokio::test]
async fn test_borrow_not_found_cases() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/borrow", Some(json!({ "bookId": 1, "memberId": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Member Not Found");

    let (status, _) = send(&app, Method::DELETE, "/borrow", Some(json!({ "bookId": 1, "memberId": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/borrow/books/member/Nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Member Not Found");
}
