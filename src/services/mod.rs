//! Business logic services

pub mod books;
pub mod borrowing;
pub mod members;

use std::sync::Arc;

use crate::{config::LibraryConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub members: members::MembersService,
    pub borrowing: borrowing::BorrowingService,
    repository: Arc<dyn Repository>,
}

impl Services {
    /// Create all services on top of the given repository
    pub fn new(repository: Arc<dyn Repository>, library: &LibraryConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            borrowing: borrowing::BorrowingService::new(repository.clone(), library.max_borrowed_books),
            repository,
        }
    }

    /// Check that the store accepts a new unit of work
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        let _uow = self.repository.begin().await?;
        Ok(())
    }
}
