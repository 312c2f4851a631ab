//! Page-number pagination for list views

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// `?page=N` (1-based) or `?page=last`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Resolved page position within a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    pub count: i64,
}

impl PageWindow {
    /// Resolve the requested page against `count` rows.
    ///
    /// The first page always exists, even when the list is empty. Any other
    /// page outside `1..=num_pages`, or a value that is not a number, is a
    /// not-found condition.
    pub fn resolve(requested: Option<&str>, count: i64, per_page: i64) -> AppResult<Self> {
        let num_pages = if count == 0 {
            1
        } else {
            (count + per_page - 1) / per_page
        };

        let page = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Page is not a number".to_string()))?,
        };

        if page < 1 {
            return Err(AppError::NotFound("That page number is less than 1".to_string()));
        }
        if page > num_pages {
            return Err(AppError::NotFound("That page contains no results".to_string()));
        }

        Ok(Self { page, per_page, num_pages, count })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn into_page<T>(self, object_list: Vec<T>) -> Page<T> {
        Page {
            object_list,
            page: self.page,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.page < self.num_pages,
            has_previous: self.page > 1,
        }
    }
}

/// One page of a list view
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookPage = Page<crate::models::book::BookSummary>,
    InstancePage = Page<crate::models::book_instance::InstanceSummary>
)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
}
