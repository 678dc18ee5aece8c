//! Repository layer: the catalog and loan store
//!
//! Every service operation runs inside one [`UnitOfWork`]. Writes become
//! visible on [`UnitOfWork::commit`]; dropping an uncommitted unit of work
//! rolls them back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use crate::{
    error::AppResult,
    models::{Book, Borrowing, Member},
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Entry point to the store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// Open a unit of work (a database transaction for Postgres)
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// Operations available inside one transaction
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UnitOfWork: Send {
    // Books
    async fn list_books(&mut self) -> AppResult<Vec<Book>>;
    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>>;
    /// Same as `find_book` but holds the row until commit/rollback
    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>>;
    async fn find_book_by_title_and_author(&mut self, title: &str, author: &str) -> AppResult<Option<Book>>;
    async fn insert_book(&mut self, title: &str, author: &str, amount: i32) -> AppResult<Book>;
    async fn update_book(&mut self, book: &Book) -> AppResult<Book>;
    async fn delete_book(&mut self, id: i64) -> AppResult<()>;

    // Members
    async fn list_members(&mut self) -> AppResult<Vec<Member>>;
    async fn find_member(&mut self, id: i64) -> AppResult<Option<Member>>;
    async fn lock_member(&mut self, id: i64) -> AppResult<Option<Member>>;
    async fn find_member_by_name(&mut self, name: &str) -> AppResult<Option<Member>>;
    async fn insert_member(&mut self, name: &str, member_date: DateTime<Utc>) -> AppResult<Member>;
    async fn update_member(&mut self, member: &Member) -> AppResult<Member>;
    async fn delete_member(&mut self, id: i64) -> AppResult<()>;

    // Borrowings
    async fn find_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Option<Borrowing>>;
    async fn count_borrowings_by_member(&mut self, member_id: i64) -> AppResult<i64>;
    async fn count_borrowings_by_book(&mut self, book_id: i64) -> AppResult<i64>;
    async fn insert_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Borrowing>;
    /// Remove every borrowing for the pair, returning how many rows went away
    async fn delete_borrowings(&mut self, book_id: i64, member_id: i64) -> AppResult<u64>;
    async fn books_borrowed_by_member(&mut self, member_id: i64) -> AppResult<Vec<Book>>;
    async fn distinct_borrowed_titles(&mut self) -> AppResult<Vec<String>>;
    /// Active borrowings grouped by book title (not by book id)
    async fn borrow_count_by_title(&mut self) -> AppResult<Vec<(String, i64)>>;

    async fn commit(&mut self) -> AppResult<()>;
}
