//! Data models for the Local Library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorFields, AuthorSummary};
pub use book::{Book, BookSummary};
pub use book_instance::{BookInstance, InstanceSummary, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use pagination::{Page, PageQuery, PageWindow};
pub use user::{User, UserClaims, CAN_MARK_RETURNED};
