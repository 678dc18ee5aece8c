//! Borrowing engine: lending and returning books

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowingDetails},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowingService {
    repository: Arc<dyn Repository>,
    max_borrowed: i64,
}

impl BorrowingService {
    pub fn new(repository: Arc<dyn Repository>, max_borrowed: i64) -> Self {
        Self {
            repository,
            max_borrowed,
        }
    }

    /// Lend one copy of a book to a member.
    ///
    /// Checks run in order and the first failure wins: member exists, book
    /// exists, a copy is on the shelf, the member is within the borrow limit,
    /// and the member does not already hold this book. The stock decrement
    /// and the new borrowing are committed together.
    ///
    /// The limit check is `count > max_borrowed`, so a member can hold
    /// `max_borrowed + 1` books before being refused.
    pub async fn borrow_book(&self, book_id: i64, member_id: i64) -> AppResult<BorrowingDetails> {
        let mut uow = self.repository.begin().await?;

        // Member row first, then book row: the same order as return_book
        let member = uow
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member Not Found".to_string()))?;

        let mut book = uow
            .lock_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book Not Found".to_string()))?;

        if !book.is_available() {
            return Err(AppError::Conflict("Book is no available for borrowing".to_string()));
        }

        if uow.count_borrowings_by_member(member.id).await? > self.max_borrowed {
            return Err(AppError::Conflict(
                "Member is no allowed to borrow any more books".to_string(),
            ));
        }

        if uow.find_borrowing(book.id, member.id).await?.is_some() {
            return Err(AppError::Conflict("Book is already borrowed".to_string()));
        }

        book.amount -= 1;
        let book = uow.update_book(&book).await?;
        let borrowing = uow.insert_borrowing(book.id, member.id).await?;
        uow.commit().await?;

        tracing::info!(
            "Book id={} borrowed by member id={} ({} copies left)",
            book.id,
            member.id,
            book.amount
        );

        Ok(BorrowingDetails {
            id: borrowing.id,
            book,
            member,
        })
    }

    /// Give a book back.
    ///
    /// No check that the member actually holds the book: the stock is always
    /// incremented and the delete may remove nothing.
    pub async fn return_book(&self, book_id: i64, member_id: i64) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;

        let member = uow
            .lock_member(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Member Not Found".to_string()))?;

        let mut book = uow
            .lock_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book Not Found".to_string()))?;

        book.amount = book.amount.checked_add(1).ok_or_else(|| {
            AppError::Conflict(format!("Book with id {} cannot take more copies", book.id))
        })?;
        let book = uow.update_book(&book).await?;
        let removed = uow.delete_borrowings(book.id, member.id).await?;
        uow.commit().await?;

        if removed == 0 {
            tracing::debug!(
                "Return of book id={} by member id={} matched no borrowing",
                book.id,
                member.id
            );
        }
        tracing::info!(
            "Book id={} returned by member id={} ({} copies on shelf)",
            book.id,
            member.id,
            book.amount
        );

        Ok(())
    }

    /// Books currently held by the member with this name
    pub async fn books_borrowed_by_member_name(&self, name: &str) -> AppResult<Vec<Book>> {
        let mut uow = self.repository.begin().await?;
        let member = uow
            .find_member_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound("Member Not Found".to_string()))?;
        uow.books_borrowed_by_member(member.id).await
    }

    /// Titles with at least one active borrowing
    pub async fn distinct_borrowed_titles(&self) -> AppResult<Vec<String>> {
        let mut uow = self.repository.begin().await?;
        uow.distinct_borrowed_titles().await
    }

    /// Active borrowings per title; books sharing a title are counted together
    pub async fn borrow_count_by_title(&self) -> AppResult<BTreeMap<String, i64>> {
        let mut uow = self.repository.begin().await?;
        Ok(uow.borrow_count_by_title().await?.into_iter().collect())
    }
}
