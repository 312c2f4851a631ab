//! Book instance (loanable copy) model and related types

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Copy availability, stored as a one-letter code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanStatus::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| format!("Invalid loan status: {}", s))
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Full book instance model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    // Computed fields (populated when queried with JOINs, None otherwise)
    #[sqlx(default)]
    #[serde(default)]
    pub book_title: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub borrower_login: Option<String>,
}

impl BookInstance {
    /// Whether the due date has passed, as of the local date
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due_back) if due_back < today)
    }

    pub fn summary(&self, today: NaiveDate) -> InstanceSummary {
        InstanceSummary {
            id: self.id,
            display: self.to_string(),
            book_id: self.book_id,
            book_title: self.book_title.clone(),
            imprint: self.imprint.clone(),
            due_back: self.due_back,
            status: self.status,
            status_display: self.status.label().to_string(),
            borrower_id: self.borrower_id,
            borrower: self.borrower_login.clone(),
            is_overdue: self.is_overdue_on(today),
        }
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title.as_deref().unwrap_or("-"))
    }
}

/// Book instance as rendered in lists and detail pages
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstanceSummary {
    pub id: Uuid,
    pub display: String,
    pub book_id: Option<i32>,
    pub book_title: Option<String>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub status_display: String,
    pub borrower_id: Option<i32>,
    pub borrower: Option<String>,
    pub is_overdue: bool,
}

/// Create/update book instance request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInstanceInput {
    /// Generated when omitted on create
    pub id: Option<Uuid>,
    pub book_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[serde(default)]
    pub status: LoanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::nil(),
            book_id: Some(1),
            imprint: "Penguin, 1974".to_string(),
            due_back,
            borrower_id: None,
            status: LoanStatus::OnLoan,
            book_title: Some("The Dispossessed".to_string()),
            borrower_login: None,
        }
    }

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let tomorrow = today.succ_opt().unwrap();

        assert!(instance(Some(yesterday)).is_overdue_on(today));
        assert!(!instance(Some(today)).is_overdue_on(today));
        assert!(!instance(Some(tomorrow)).is_overdue_on(today));
        assert!(!instance(None).is_overdue_on(today));
    }

    #[test]
    fn test_status_codes() {
        for status in LoanStatus::ALL {
            assert_eq!(status.code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
        assert_eq!(LoanStatus::OnLoan.label(), "On loan");
        assert_eq!(serde_json::to_string(&LoanStatus::Available).unwrap(), "\"a\"");
    }

    #[test]
    fn test_display_and_summary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let copy = instance(NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            copy.to_string(),
            "00000000-0000-0000-0000-000000000000 (The Dispossessed)"
        );

        let summary = copy.summary(today);
        assert!(summary.is_overdue);
        assert_eq!(summary.status_display, "On loan");
    }
}
