//! Book model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z].*").expect("valid title regex"));

static AUTHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+$").expect("valid author regex"));

/// Book record. `amount` is the number of copies currently on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub amount: i32,
}

/// Create / update book request.
///
/// There is no stock field: a new title always starts with one copy, and an
/// `amount` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    /// Title, starting with a capital letter
    #[validate(
        length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"),
        regex(path = *TITLE_RE, message = "Title should start with the capital letter")
    )]
    pub title: String,
    /// Author as "Firstname Lastname"
    #[validate(
        length(max = 255, message = "Author must be at most 255 characters"),
        regex(path = *AUTHOR_RE, message = "Author must look like 'Firstname Lastname'")
    )]
    pub author: String,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.amount > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, author: &str) -> BookRequest {
        BookRequest {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("Clean Code", "Robert Martin").validate().is_ok());
    }

    #[test]
    fn test_title_rules() {
        let errors = request("Ab", "Robert Martin").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let errors = request("clean code", "Robert Martin").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let errors = request("", "Robert Martin").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_author_pattern() {
        for author in ["robert martin", "Robert", "Robert C Martin", "ROBERT MARTIN", " "] {
            let errors = request("Clean Code", author).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("author"), "{author:?} should be rejected");
        }
    }

    #[test]
    fn test_overlong_fields_rejected() {
        let long = format!("C{}", "a".repeat(255));
        let errors = request(&long, "Robert Martin").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let author = format!("Robert M{}", "a".repeat(255));
        let errors = request("Clean Code", &author).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("author"));

        assert!(request(&long[..255], "Robert Martin").validate().is_ok());
    }

    #[test]
    fn test_client_amount_is_ignored() {
        let req: BookRequest = serde_json::from_str(
            r#"{"title": "Clean Code", "author": "Robert Martin", "amount": -1}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
