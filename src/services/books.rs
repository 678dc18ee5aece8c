//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Arc<dyn Repository>,
}

impl BooksService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        uow.list_books().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let mut uow = self.repository.begin().await?;
        uow.find_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Register a book. A title+author already in the catalog counts as one
    /// more copy of that book rather than a new record; a new title starts
    /// with a single copy.
    pub async fn create(&self, request: &BookRequest) -> AppResult<Book> {
        let mut uow = self.repository.begin().await?;

        let book = match uow
            .find_book_by_title_and_author(&request.title, &request.author)
            .await?
        {
            Some(mut existing) => {
                existing.amount = existing.amount.checked_add(1).ok_or_else(|| {
                    AppError::Conflict(format!("Book with id {} cannot take more copies", existing.id))
                })?;
                let book = uow.update_book(&existing).await?;
                tracing::info!("Book id={} got another copy ({} on shelf)", book.id, book.amount);
                book
            }
            None => {
                let book = uow
                    .insert_book(&request.title, &request.author, 1)
                    .await?;
                tracing::info!("Book id={} created: {} by {}", book.id, book.title, book.author);
                book
            }
        };

        uow.commit().await?;
        Ok(book)
    }

    /// Overwrite title and author; the stock is left alone
    pub async fn update(&self, id: i64, request: &BookRequest) -> AppResult<Book> {
        let mut uow = self.repository.begin().await?;

        let mut book = uow
            .lock_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        book.title = request.title.clone();
        book.author = request.author.clone();

        let book = uow.update_book(&book).await?;
        uow.commit().await?;
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;

        let book = uow
            .lock_book(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if uow.count_borrowings_by_book(book.id).await? > 0 {
            return Err(AppError::Conflict(format!("Book with id {} is borrowing a book", id)));
        }

        uow.delete_book(book.id).await?;
        uow.commit().await?;
        tracing::info!("Book id={} deleted", id);
        Ok(())
    }
}
