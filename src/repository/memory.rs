//! In-memory repository
//!
//! The whole store sits behind one async mutex. A unit of work owns the
//! guard for its lifetime, so units of work are serialized. Reads go straight
//! to the guarded state; the first write takes a private copy, which only
//! replaces the shared state on commit. A dropped unit of work leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Repository, UnitOfWork};
use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrowing, Member},
};

#[derive(Debug, Clone, Default)]
struct State {
    books: BTreeMap<i64, Book>,
    members: BTreeMap<i64, Member>,
    borrowings: BTreeMap<i64, Borrowing>,
    last_book_id: i64,
    last_member_id: i64,
    last_borrowing_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn open(&self) -> MemoryUnitOfWork {
        MemoryUnitOfWork {
            guard: Some(self.state.clone().lock_owned().await),
            working: None,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(self.open().await))
    }
}

pub struct MemoryUnitOfWork {
    guard: Option<OwnedMutexGuard<State>>,
    /// Copy of the state, taken on the first write
    working: Option<State>,
}

fn finished() -> AppError {
    AppError::Internal("Transaction already committed".to_string())
}

impl MemoryUnitOfWork {
    fn state(&self) -> AppResult<&State> {
        match (&self.working, &self.guard) {
            (Some(working), _) => Ok(working),
            (None, Some(guard)) => Ok(&**guard),
            (None, None) => Err(finished()),
        }
    }

    fn state_mut(&mut self) -> AppResult<&mut State> {
        if self.working.is_none() {
            let guard = self.guard.as_ref().ok_or_else(finished)?;
            self.working = Some((**guard).clone());
        }
        self.working.as_mut().ok_or_else(finished)
    }
}

fn borrowed_books(state: &State) -> impl Iterator<Item = &Book> {
    state
        .borrowings
        .values()
        .filter_map(|b| state.books.get(&b.book_id))
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn list_books(&mut self) -> AppResult<Vec<Book>> {
        Ok(self.state()?.books.values().cloned().collect())
    }

    async fn find_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        Ok(self.state()?.books.get(&id).cloned())
    }

    async fn lock_book(&mut self, id: i64) -> AppResult<Option<Book>> {
        self.find_book(id).await
    }

    async fn find_book_by_title_and_author(&mut self, title: &str, author: &str) -> AppResult<Option<Book>> {
        Ok(self
            .state()?
            .books
            .values()
            .find(|b| b.title == title && b.author == author)
            .cloned())
    }

    async fn insert_book(&mut self, title: &str, author: &str, amount: i32) -> AppResult<Book> {
        if amount < 0 {
            return Err(AppError::Internal(format!("Negative amount {} for book", amount)));
        }
        let state = self.state_mut()?;
        state.last_book_id += 1;
        let book = Book {
            id: state.last_book_id,
            title: title.to_string(),
            author: author.to_string(),
            amount,
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&mut self, book: &Book) -> AppResult<Book> {
        if book.amount < 0 {
            return Err(AppError::Internal(format!("Negative amount {} for book {}", book.amount, book.id)));
        }
        let slot = self
            .state_mut()?
            .books
            .get_mut(&book.id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book.id)))?;
        *slot = book.clone();
        Ok(book.clone())
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<()> {
        let state = self.state_mut()?;
        state
            .books
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        state.borrowings.retain(|_, b| b.book_id != id);
        Ok(())
    }

    async fn list_members(&mut self) -> AppResult<Vec<Member>> {
        Ok(self.state()?.members.values().cloned().collect())
    }

    async fn find_member(&mut self, id: i64) -> AppResult<Option<Member>> {
        Ok(self.state()?.members.get(&id).cloned())
    }

    async fn lock_member(&mut self, id: i64) -> AppResult<Option<Member>> {
        self.find_member(id).await
    }

    async fn find_member_by_name(&mut self, name: &str) -> AppResult<Option<Member>> {
        Ok(self.state()?.members.values().find(|m| m.name == name).cloned())
    }

    async fn insert_member(&mut self, name: &str, member_date: DateTime<Utc>) -> AppResult<Member> {
        let state = self.state_mut()?;
        state.last_member_id += 1;
        let member = Member {
            id: state.last_member_id,
            name: name.to_string(),
            member_date,
        };
        state.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update_member(&mut self, member: &Member) -> AppResult<Member> {
        let slot = self
            .state_mut()?
            .members
            .get_mut(&member.id)
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", member.id)))?;
        slot.name = member.name.clone();
        Ok(slot.clone())
    }

    async fn delete_member(&mut self, id: i64) -> AppResult<()> {
        let state = self.state_mut()?;
        state
            .members
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;
        state.borrowings.retain(|_, b| b.member_id != id);
        Ok(())
    }

    async fn find_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Option<Borrowing>> {
        Ok(self
            .state()?
            .borrowings
            .values()
            .find(|b| b.book_id == book_id && b.member_id == member_id)
            .cloned())
    }

    async fn count_borrowings_by_member(&mut self, member_id: i64) -> AppResult<i64> {
        Ok(self
            .state()?
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id)
            .count() as i64)
    }

    async fn count_borrowings_by_book(&mut self, book_id: i64) -> AppResult<i64> {
        Ok(self
            .state()?
            .borrowings
            .values()
            .filter(|b| b.book_id == book_id)
            .count() as i64)
    }

    async fn insert_borrowing(&mut self, book_id: i64, member_id: i64) -> AppResult<Borrowing> {
        let state = self.state_mut()?;
        if !state.books.contains_key(&book_id) || !state.members.contains_key(&member_id) {
            return Err(AppError::Internal(format!(
                "Borrowing references missing book {} or member {}",
                book_id, member_id
            )));
        }
        state.last_borrowing_id += 1;
        let borrowing = Borrowing {
            id: state.last_borrowing_id,
            book_id,
            member_id,
        };
        state.borrowings.insert(borrowing.id, borrowing.clone());
        Ok(borrowing)
    }

    async fn delete_borrowings(&mut self, book_id: i64, member_id: i64) -> AppResult<u64> {
        let state = self.state_mut()?;
        let before = state.borrowings.len();
        state
            .borrowings
            .retain(|_, b| !(b.book_id == book_id && b.member_id == member_id));
        Ok((before - state.borrowings.len()) as u64)
    }

    async fn books_borrowed_by_member(&mut self, member_id: i64) -> AppResult<Vec<Book>> {
        let state = self.state()?;
        Ok(state
            .borrowings
            .values()
            .filter(|b| b.member_id == member_id)
            .filter_map(|b| state.books.get(&b.book_id).cloned())
            .collect())
    }

    async fn distinct_borrowed_titles(&mut self) -> AppResult<Vec<String>> {
        let titles: BTreeSet<String> = borrowed_books(self.state()?).map(|b| b.title.clone()).collect();
        Ok(titles.into_iter().collect())
    }

    async fn borrow_count_by_title(&mut self) -> AppResult<Vec<(String, i64)>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for book in borrowed_books(self.state()?) {
            *counts.entry(book.title.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self.guard.take().ok_or_else(finished)?;
        if let Some(working) = self.working.take() {
            *guard = working;
        }
        Ok(())
    }
}
