//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::{author_display, author_url, Author, AuthorSummary},
    book_instance::InstanceSummary,
    genre::Genre,
};

/// A catalog title (not a specific copy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    /// 13 character ISBN; length is advisory
    pub isbn: String,
}

impl Book {
    /// Canonical URL of the book detail view
    pub fn url(&self) -> String {
        book_url(self.id)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

pub fn book_url(id: i32) -> String {
    format!("/book/{}/", id)
}

/// Internal row for list queries joined with the author
#[derive(Debug, Clone, FromRow)]
pub struct BookListRow {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
}

/// Book entry of the paginated book list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: Option<AuthorSummary>,
    pub url: String,
}

impl From<BookListRow> for BookSummary {
    fn from(row: BookListRow) -> Self {
        let author = match (row.author_id, row.author_last_name, row.author_first_name) {
            (Some(id), Some(last), Some(first)) => Some(AuthorSummary {
                id,
                name: author_display(&last, &first),
                url: author_url(id),
            }),
            _ => None,
        };

        BookSummary {
            id: row.id,
            url: book_url(row.id),
            title: row.title,
            author,
        }
    }
}

/// Book detail payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<AuthorSummary>,
    pub genres: Vec<Genre>,
    /// Copies of this title
    pub instances: Vec<InstanceSummary>,
    /// Every copy in the library, regardless of title
    pub all_instances: Vec<InstanceSummary>,
}

impl BookDetail {
    pub fn new(
        book: Book,
        author: Option<&Author>,
        genres: Vec<Genre>,
        instances: Vec<InstanceSummary>,
        all_instances: Vec<InstanceSummary>,
    ) -> Self {
        Self {
            author: author.map(Author::summary),
            book,
            genres,
            instances,
            all_instances,
        }
    }
}

/// Create/update book request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    #[validate(length(max = 13, message = "ISBN must be at most 13 characters"))]
    #[serde(default)]
    pub isbn: String,
    #[validate(length(min = 1, message = "Select at least one genre"))]
    pub genre_ids: Vec<i32>,
}

impl BookInput {
    /// Selected genres with repeats removed
    pub fn unique_genre_ids(&self) -> Vec<i32> {
        let mut ids = self.genre_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_genre_ids() {
        let input = BookInput {
            title: "The Dispossessed".to_string(),
            author_id: None,
            summary: String::new(),
            isbn: String::new(),
            genre_ids: vec![3, 1, 3, 1],
        };
        assert!(input.validate().is_ok());
        assert_eq!(input.unique_genre_ids(), vec![1, 3]);
    }

    #[test]
    fn test_summary_with_author() {
        let summary = BookSummary::from(BookListRow {
            id: 3,
            title: "The Dispossessed".to_string(),
            author_id: Some(7),
            author_first_name: Some("Ursula".to_string()),
            author_last_name: Some("Le Guin".to_string()),
        });
        assert_eq!(summary.url, "/book/3/");
        let author = summary.author.unwrap();
        assert_eq!(author.name, "Le Guin (Ursula)");
        assert_eq!(author.url, "/author/7/");
    }

    #[test]
    fn test_summary_without_author() {
        let summary = BookSummary::from(BookListRow {
            id: 4,
            title: "Orphan".to_string(),
            author_id: None,
            author_first_name: None,
            author_last_name: None,
        });
        assert!(summary.author.is_none());
    }

    #[test]
    fn test_input_requires_genre_and_short_isbn() {
        let mut input = BookInput {
            title: "Title".to_string(),
            author_id: None,
            summary: String::new(),
            isbn: "9780000000000".to_string(),
            genre_ids: vec![1],
        };
        assert!(input.validate().is_ok());

        input.isbn = "97800000000001".to_string();
        assert!(input.validate().is_err());

        input.isbn = String::new();
        input.genre_ids.clear();
        assert!(input.validate().is_err());
    }
}
