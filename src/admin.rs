//! Declarative admin registrations: which models the staff interface exposes,
//! and how each one is listed, filtered, grouped and inlined.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Group of fields on a change form; each inner slice is one row
#[derive(Debug, Serialize)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static [&'static str]],
}

/// Dependent rows edited on the parent's change form
#[derive(Debug, Serialize)]
pub struct Inline {
    pub model: &'static str,
    pub fk: &'static str,
    pub extra: u32,
}

#[derive(Debug, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub verbose_name: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub fieldsets: &'static [Fieldset],
    pub inlines: &'static [Inline],
}

pub static REGISTRY: &[ModelAdmin] = &[
    ModelAdmin {
        model: "genre",
        verbose_name: "Genre",
        list_display: &["__str__"],
        list_filter: &[],
        fieldsets: &[Fieldset { name: None, fields: &[&["name"]] }],
        inlines: &[],
    },
    ModelAdmin {
        model: "language",
        verbose_name: "Language",
        list_display: &["__str__"],
        list_filter: &[],
        fieldsets: &[Fieldset { name: None, fields: &[&["name"]] }],
        inlines: &[],
    },
    ModelAdmin {
        model: "author",
        verbose_name: "Author",
        list_display: &["last_name", "first_name", "date_of_birth", "date_of_death"],
        list_filter: &[],
        fieldsets: &[Fieldset {
            name: None,
            fields: &[&["first_name"], &["last_name"], &["date_of_birth", "date_of_death"]],
        }],
        inlines: &[Inline { model: "book", fk: "author", extra: 0 }],
    },
    ModelAdmin {
        model: "book",
        verbose_name: "Book",
        list_display: &["title", "author", "display_genre"],
        list_filter: &[],
        fieldsets: &[Fieldset {
            name: None,
            fields: &[&["title"], &["author"], &["summary"], &["isbn"], &["genre"]],
        }],
        inlines: &[Inline { model: "bookinstance", fk: "book", extra: 0 }],
    },
    ModelAdmin {
        model: "bookinstance",
        verbose_name: "Book instance",
        list_display: &["book", "status", "borrower", "due_back", "id"],
        list_filter: &["status", "due_back"],
        fieldsets: &[
            Fieldset { name: None, fields: &[&["book"], &["imprint"], &["id"]] },
            Fieldset {
                name: Some("Availability"),
                fields: &[&["status"], &["due_back"], &["borrower"]],
            },
        ],
        inlines: &[],
    },
];

pub fn lookup(model: &str) -> AppResult<&'static ModelAdmin> {
    REGISTRY
        .iter()
        .find(|admin| admin.model == model)
        .ok_or_else(|| AppError::NotFound(format!("Model {} is not registered", model)))
}

/// Keep only the listed columns of an admin row (plus its primary key)
pub fn project(row: &Map<String, Value>, columns: &[&str]) -> Map<String, Value> {
    std::iter::once("id")
        .chain(columns.iter().copied())
        .map(|column| {
            (
                column.to_string(),
                row.get(column).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

/// Date filter choices for a `list_filter` date column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

impl DateFilter {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "today" => Ok(DateFilter::Today),
            "past_7_days" => Ok(DateFilter::PastSevenDays),
            "this_month" => Ok(DateFilter::ThisMonth),
            "this_year" => Ok(DateFilter::ThisYear),
            "no_date" => Ok(DateFilter::NoDate),
            "has_date" => Ok(DateFilter::HasDate),
            other => Err(AppError::BadRequest(format!("Unknown date filter: {}", other))),
        }
    }

    /// Inclusive date bounds selected by this filter, relative to `today`
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            DateFilter::Today => (Some(today), Some(today)),
            DateFilter::PastSevenDays => (Some(today - Duration::days(7)), Some(today)),
            DateFilter::ThisMonth => {
                let first = today.with_day(1);
                let last = first
                    .and_then(|d| d.checked_add_months(Months::new(1)))
                    .and_then(|d| d.pred_opt());
                (first, last)
            }
            DateFilter::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year(), 12, 31),
            ),
            DateFilter::NoDate | DateFilter::HasDate => (None, None),
        }
    }

    /// Whether the filter restricts the column to set / unset values
    pub fn requires_date(&self) -> Option<bool> {
        match self {
            DateFilter::NoDate => Some(false),
            DateFilter::HasDate => Some(true),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_contents() {
        let models: Vec<_> = REGISTRY.iter().map(|m| m.model).collect();
        assert_eq!(models, ["genre", "language", "author", "book", "bookinstance"]);

        let instance = lookup("bookinstance").unwrap();
        assert_eq!(instance.fieldsets[0].name, None);
        assert_eq!(instance.fieldsets[1].name, Some("Availability"));
        assert_eq!(lookup("author").unwrap().inlines[0].model, "book");
        assert_eq!(lookup("book").unwrap().inlines[0].model, "bookinstance");
        assert!(lookup("user").is_err());
    }

    #[test]
    fn test_project() {
        let row = json!({
            "id": 3,
            "title": "Dune",
            "author": "Herbert (Frank)",
            "summary": "Spice",
        });
        let projected = project(row.as_object().unwrap(), &["title", "author", "display_genre"]);
        assert_eq!(
            Value::Object(projected),
            json!({"id": 3, "title": "Dune", "author": "Herbert (Frank)", "display_genre": null})
        );
    }

    #[test]
    fn test_date_filter_bounds() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(
            DateFilter::parse("this_month").unwrap().bounds(today),
            (NaiveDate::from_ymd_opt(2024, 5, 1), NaiveDate::from_ymd_opt(2024, 5, 31))
        );
        assert_eq!(
            DateFilter::parse("this_year").unwrap().bounds(today),
            (NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 12, 31))
        );

        // Copies due later in the period are still inside it
        let (from, to) = DateFilter::ThisMonth.bounds(today);
        let due = NaiveDate::from_ymd_opt(2024, 5, 25);
        assert!(from <= due && due <= to);

        let december = NaiveDate::from_ymd_opt(2024, 12, 3).unwrap();
        assert_eq!(DateFilter::ThisMonth.bounds(december).1, NaiveDate::from_ymd_opt(2024, 12, 31));
        let leap = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(DateFilter::ThisMonth.bounds(leap).1, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(
            DateFilter::parse("past_7_days").unwrap().bounds(today),
            (NaiveDate::from_ymd_opt(2024, 5, 10), Some(today))
        );
        assert_eq!(DateFilter::parse("no_date").unwrap().requires_date(), Some(false));
        assert!(DateFilter::parse("yesterday").is_err());
    }
}
