//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A literary genre (e.g. Science Fiction, French Poetry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Create/update genre request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

/// Comma-separated names of the first three genres, as shown in admin lists
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre { id, name: name.to_string() }
    }

    #[test]
    fn test_display_genre_truncates_to_three() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Poetry"),
            genre(3, "Horror"),
            genre(4, "Western"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Poetry, Horror");
    }

    #[test]
    fn test_display_genre_empty() {
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn test_empty_name_rejected() {
        let input = GenreInput { name: String::new() };
        assert!(input.validate().is_err());
    }
}
