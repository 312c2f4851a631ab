//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::Book;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Canonical URL of the author detail view
    pub fn url(&self) -> String {
        author_url(self.id)
    }

    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            name: self.to_string(),
            url: self.url(),
        }
    }

    /// Editable fields of this author, as used to pre-fill the update form
    pub fn fields(&self) -> AuthorFields {
        AuthorFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", author_display(&self.last_name, &self.first_name))
    }
}

pub fn author_url(id: i32) -> String {
    format!("/author/{}/", id)
}

/// "Last (First)"
pub fn author_display(last_name: &str, first_name: &str) -> String {
    format!("{} ({})", last_name, first_name)
}

/// Short author reference embedded in book payloads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
    pub url: String,
}

/// The four editable author fields, shared by the author views and the admin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorFields {
    #[validate(length(min = 1, max = 100, message = "Ensure this value has at most 100 characters and is not empty."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Ensure this value has at most 100 characters and is not empty."))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Author detail payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: Author,
    pub display: String,
    pub books: Vec<Book>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Author {
        Author {
            id: 7,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1929, 10, 21),
            date_of_death: NaiveDate::from_ymd_opt(2018, 1, 22),
        }
    }

    #[test]
    fn test_display_and_url() {
        let a = author();
        assert_eq!(a.to_string(), "Le Guin (Ursula)");
        assert_eq!(a.url(), "/author/7/");
        assert_eq!(a.summary().name, "Le Guin (Ursula)");
    }

    #[test]
    fn test_fields_validate() {
        let mut fields = author().fields();
        assert!(fields.validate().is_ok());

        fields.first_name = "x".repeat(101);
        assert!(fields.validate().is_err());

        fields.first_name = String::new();
        assert!(fields.validate().is_err());
    }
}
