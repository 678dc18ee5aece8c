//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use lending_server::{
    config::{AppConfig, LibraryConfig},
    models::{Book, BookRequest, Member, MemberRequest},
    repository::MemoryRepository,
    services::Services,
    AppState,
};

pub fn services(max_borrowed_books: i64) -> Services {
    Services::new(
        Arc::new(MemoryRepository::new()),
        &LibraryConfig { max_borrowed_books },
    )
}

pub fn app_state(max_borrowed_books: i64) -> AppState {
    let mut config = AppConfig::default();
    config.library.max_borrowed_books = max_borrowed_books;
    AppState::new(&config, Arc::new(MemoryRepository::new()))
}

pub fn book_request(title: &str, author: &str) -> BookRequest {
    BookRequest {
        title: title.to_string(),
        author: author.to_string(),
    }
}

pub async fn add_book(services: &Services, title: &str, author: &str) -> Book {
    services
        .books
        .create(&book_request(title, author))
        .await
        .expect("create book")
}

pub async fn add_member(services: &Services, name: &str) -> Member {
    services
        .members
        .create(&MemberRequest {
            name: name.to_string(),
        })
        .await
        .expect("create member")
}
