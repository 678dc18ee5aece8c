//! Library lending tracker
//!
//! Manages books, members and the borrowings between them, exposed as a
//! REST JSON API backed by Postgres (or an in-memory store).

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: &AppConfig, repository: Arc<dyn repository::Repository>) -> Self {
        Self {
            services: Arc::new(services::Services::new(repository, &config.library)),
        }
    }
}
