//! Bound HTML-style forms: raw submissions are parsed, cleaned and validated
//! into typed values or a map of field errors.

use std::{borrow::Cow, collections::BTreeMap};

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::AuthorFields;

/// Days ahead proposed on a blank renewal form
pub const PROPOSED_RENEWAL_DAYS: i64 = 21;
/// Furthest a loan may be renewed, in days from today
pub const MAX_RENEWAL_DAYS: i64 = 28;

const REQUIRED: &str = "This field is required.";
const INVALID_DATE: &str = "Enter a valid date.";

/// Error messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Accepted date input formats, tried in order
const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Flatten validator errors into per-field messages
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn add_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

// ---------------------------------------------------------------------------
// Renewal
// ---------------------------------------------------------------------------

/// Raw renewal submission, `renewal_date=YYYY-MM-DD`
#[serde_as]
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenewBookSubmission {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub renewal_date: Option<String>,
}

/// Cleaned renewal form
#[derive(Debug, Clone, Copy, Serialize, Validate, ToSchema)]
pub struct RenewBookForm {
    /// Enter a date between now and 4 weeks (default 3)
    #[validate(custom(function = "validate_renewal_date"))]
    pub renewal_date: NaiveDate,
}

/// The renewal window is `today ..= today + 4 weeks`
pub fn check_renewal_date(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date < today {
        return Err(validation_error(
            "renewal_in_past",
            "Invalid date - renewal in past",
        ));
    }
    if date > today + Duration::days(MAX_RENEWAL_DAYS) {
        return Err(validation_error(
            "renewal_too_far",
            "Invalid date - renewal more than 4 weeks ahead",
        ));
    }
    Ok(())
}

fn validate_renewal_date(date: &NaiveDate) -> Result<(), ValidationError> {
    check_renewal_date(*date, Local::now().date_naive())
}

impl RenewBookForm {
    /// Initial form state for a GET
    pub fn proposed(today: NaiveDate) -> Self {
        Self {
            renewal_date: today + Duration::days(PROPOSED_RENEWAL_DAYS),
        }
    }

    /// Bind a submission, returning the cleaned date or the field errors
    pub fn bind(submission: &RenewBookSubmission) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let Some(raw) = submission.renewal_date.as_deref() else {
            add_error(&mut errors, "renewal_date", REQUIRED);
            return Err(errors);
        };
        let Some(renewal_date) = parse_date_input(raw) else {
            add_error(&mut errors, "renewal_date", INVALID_DATE);
            return Err(errors);
        };

        let form = Self { renewal_date };
        form.validate().map_err(|e| field_errors(&e))?;
        Ok(form)
    }
}

// ---------------------------------------------------------------------------
// Author
// ---------------------------------------------------------------------------

/// Raw author form submission; empty date inputs mean "no date"
#[serde_as]
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorSubmission {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date_of_death: Option<String>,
}

pub struct AuthorForm;

impl AuthorForm {
    /// Initial values of a blank create form
    pub fn initial() -> AuthorSubmission {
        AuthorSubmission {
            date_of_death: Some("05/01/2018".to_string()),
            ..Default::default()
        }
    }

    /// Bind a submission, returning the cleaned fields or the field errors
    pub fn bind(submission: &AuthorSubmission) -> Result<AuthorFields, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = submission.first_name.trim().to_string();
        let last_name = submission.last_name.trim().to_string();
        if first_name.is_empty() {
            add_error(&mut errors, "first_name", REQUIRED);
        }
        if last_name.is_empty() {
            add_error(&mut errors, "last_name", REQUIRED);
        }

        let mut date = |field: &str, raw: &Option<String>| match raw.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = parse_date_input(raw);
                if parsed.is_none() {
                    add_error(&mut errors, field, INVALID_DATE);
                }
                parsed
            }
        };
        let date_of_birth = date("date_of_birth", &submission.date_of_birth);
        let date_of_death = date("date_of_death", &submission.date_of_death);

        let fields = AuthorFields {
            first_name,
            last_name,
            date_of_birth,
            date_of_death,
        };
        if let Err(e) = fields.validate() {
            for (field, messages) in field_errors(&e) {
                errors.entry(field).or_insert(messages);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(fields)
    }
}

impl From<&AuthorFields> for AuthorSubmission {
    fn from(fields: &AuthorFields) -> Self {
        Self {
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            date_of_birth: fields.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            date_of_death: fields.date_of_death.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(date: NaiveDate) -> Result<RenewBookForm, FieldErrors> {
        RenewBookForm::bind(&RenewBookSubmission {
            renewal_date: Some(date.format("%Y-%m-%d").to_string()),
        })
    }

    #[test]
    fn test_check_renewal_window() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();

        assert!(check_renewal_date(today, today).is_ok());
        assert!(check_renewal_date(today + Duration::days(28), today).is_ok());

        let past = check_renewal_date(today - Duration::days(1), today).unwrap_err();
        assert_eq!(past.code, "renewal_in_past");

        let far = check_renewal_date(today + Duration::days(29), today).unwrap_err();
        assert_eq!(far.code, "renewal_too_far");
    }

    #[test]
    fn test_bind_rejects_yesterday() {
        let today = Local::now().date_naive();
        let errors = submit(today - Duration::days(1)).unwrap_err();
        assert_eq!(
            errors["renewal_date"],
            vec!["Invalid date - renewal in past".to_string()]
        );
    }

    #[test]
    fn test_bind_rejects_more_than_four_weeks() {
        let today = Local::now().date_naive();
        let errors = submit(today + Duration::days(29)).unwrap_err();
        assert_eq!(
            errors["renewal_date"],
            vec!["Invalid date - renewal more than 4 weeks ahead".to_string()]
        );
    }

    #[test]
    fn test_bind_accepts_next_week() {
        let next_week = Local::now().date_naive() + Duration::days(7);
        assert_eq!(submit(next_week).unwrap().renewal_date, next_week);
    }

    #[test]
    fn test_bind_missing_or_garbled_date() {
        let missing = RenewBookForm::bind(&RenewBookSubmission::default()).unwrap_err();
        assert_eq!(missing["renewal_date"], vec![REQUIRED.to_string()]);

        let garbled = RenewBookForm::bind(&RenewBookSubmission {
            renewal_date: Some("31/31/2024".to_string()),
        })
        .unwrap_err();
        assert_eq!(garbled["renewal_date"], vec![INVALID_DATE.to_string()]);
    }

    #[test]
    fn test_proposed_date_is_three_weeks_out() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(
            RenewBookForm::proposed(today).renewal_date,
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
        );
    }

    #[test]
    fn test_author_initial_date_of_death() {
        let initial = AuthorForm::initial();
        let parsed = parse_date_input(initial.date_of_death.as_deref().unwrap());
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2018, 5, 1));
    }

    #[test]
    fn test_author_bind() {
        let fields = AuthorForm::bind(&AuthorSubmission {
            first_name: " Isaac ".to_string(),
            last_name: "Asimov".to_string(),
            date_of_birth: Some("1920-01-02".to_string()),
            date_of_death: None,
        })
        .unwrap();
        assert_eq!(fields.first_name, "Isaac");
        assert_eq!(fields.date_of_birth, NaiveDate::from_ymd_opt(1920, 1, 2));
        assert_eq!(fields.date_of_death, None);
    }

    #[test]
    fn test_author_bind_errors() {
        let errors = AuthorForm::bind(&AuthorSubmission {
            first_name: String::new(),
            last_name: "x".repeat(101),
            date_of_birth: Some("not a date".to_string()),
            date_of_death: None,
        })
        .unwrap_err();
        assert_eq!(errors["first_name"], vec![REQUIRED.to_string()]);
        assert_eq!(errors["date_of_birth"], vec![INVALID_DATE.to_string()]);
        assert!(errors.contains_key("last_name"));
    }

    #[test]
    fn test_author_bind_reports_every_field() {
        let errors = AuthorForm::bind(&AuthorSubmission {
            first_name: "Ok".to_string(),
            last_name: "x".repeat(101),
            date_of_birth: Some("not a date".to_string()),
            date_of_death: None,
        })
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["date_of_birth"], vec![INVALID_DATE.to_string()]);
        assert_eq!(errors["last_name"].len(), 1);
        assert!(!errors.contains_key("first_name"));
    }
}
