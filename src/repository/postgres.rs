//! Postgres-backed repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use super::{Repository, UnitOfWork};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrowing, Member},
};

#[derive(Clone)]
pub struct PgRepository {
    pool: Pool<Postgres>,
}

impl PgRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// Wraps one transaction; rolled back on drop unless committed
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> AppResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Transaction already committed".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(self.conn()?)
            .await?;
        Ok(books)
    }

    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(book)
    }

    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(book)
    }

    async fn find_book_by_title_and_author(&mut self, title: &str, author: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE title = $1 AND author = $2 ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(title)
        .bind(author)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(book)
    }

    async fn insert_book(&mut self, title: &str, author: &str, amount: i32) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, amount)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(amount)
        .fetch_one(self.conn()?)
        .await?;
        Ok(book)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "UPDATE books SET title = $1, author = $2, amount = $3 WHERE id = $4 RETURNING *",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.amount)
        .bind(book.id)
        .fetch_optional(self.conn()?)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book.id)))
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn list_members(&mut self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY id")
            .fetch_all(self.conn()?)
            .await?;
        Ok(members)
    }

    async fn find_member(&mut self, id: i64) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(member)
    }

    async fn lock_member(&mut self, id: i64) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await?;
        Ok(member)
    }

    async fn find_member_by_name(&mut self, name: &str) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(member)
    }

    async fn insert_member(&mut self, name: &str, member_date: DateTime<Utc>) -> AppResult<Member> {
        let member = sqlx::query_as::<_, Member>(
            "INSERT INTO members (name, member_date) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(member_date)
        .fetch_one(self.conn()?)
        .await?;
        Ok(member)
    }

    async fn update_member(&mut self, member: &Member) -> AppResult<Member> {
        // member_date is never rewritten
        sqlx::query_as::<_, Member>("UPDATE members SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&member.name)
            .bind(member.id)
            .fetch_optional(self.conn()?)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", member.id)))
    }

    async fn delete_member(&mut self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member with id {} not found", id)));
        }
        Ok(())
    }

    async fn find_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Option<Borrowing>> {
        let borrowing = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE book_id = $1 AND member_id = $2 LIMIT 1",
        )
        .bind(book_id)
        .bind(member_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(borrowing)
    }

    async fn count_borrowings_by_member(&mut self, member_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE member_id = $1")
            .bind(member_id)
            .fetch_one(self.conn()?)
            .await?;
        Ok(count)
    }

    async fn count_borrowings_by_book(&mut self, book_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(self.conn()?)
            .await?;
        Ok(count)
    }

    async fn insert_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Borrowing> {
        let borrowing = sqlx::query_as::<_, Borrowing>(
            "INSERT INTO borrowings (book_id, member_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(book_id)
        .bind(member_id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(borrowing)
    }

    async fn delete_borrowings(&mut self, book_id: i64, member_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM borrowings WHERE book_id = $1 AND member_id = $2")
            .bind(book_id)
            .bind(member_id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected())
    }

    async fn books_borrowed_by_member(&mut self, member_id: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM borrowings br
            JOIN books b ON br.book_id = b.id
            WHERE br.member_id = $1
            ORDER BY br.id
            "#,
        )
        .bind(member_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(books)
    }

    async fn distinct_borrowed_titles(&mut self) -> AppResult<Vec<String>> {
        let titles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT b.title
            FROM borrowings br
            JOIN books b ON br.book_id = b.id
            ORDER BY b.title
            "#,
        )
        .fetch_all(self.conn()?)
        .await?;
        Ok(titles)
    }

    async fn borrow_count_by_title(&mut self) -> AppResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT b.title, COUNT(*)::bigint AS borrow_count
            FROM borrowings br
            JOIN books b ON br.book_id = b.id
            GROUP BY b.title
            ORDER BY b.title
            "#,
        )
        .fetch_all(self.conn()?)
        .await?;
        Ok(rows)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("Transaction already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
