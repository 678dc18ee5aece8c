//! Data models for the lending tracker

pub mod book;
pub mod borrowing;
pub mod member;

// Re-export commonly used types
pub use book::{Book, BookRequest};
pub use borrowing::{BorrowRequest, Borrowing, BorrowingDetails};
pub use member::{Member, MemberRequest};
