//! Staff administration endpoints over the registered models

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    admin::{DateFilter, ModelAdmin},
    error::{AppError, AppResult},
    models::{
        book_instance::LoanStatus,
        user::{CreateUser, User},
    },
    services::admin::{ChangeForm, ChangeList, ChangeListFilter},
    AppState,
};

use super::AuthenticatedUser;

/// Change list filters (book instances only)
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ChangeListQuery {
    /// Loan status code: m, o, a or r
    pub status: Option<String>,
    /// today, past_7_days, this_month, this_year, no_date or has_date
    pub due_back: Option<String>,
}

impl ChangeListQuery {
    fn into_filter(self) -> AppResult<ChangeListFilter> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<LoanStatus>().map_err(AppError::BadRequest))
            .transpose()?;
        let due_back = self
            .due_back
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(DateFilter::parse)
            .transpose()?;
        Ok(ChangeListFilter { status, due_back })
    }
}

/// Registered models
pub async fn index(State(state): State<AppState>) -> Json<&'static [ModelAdmin]> {
    Json(state.services.admin.registry())
}

#[utoipa::path(
    get,
    path = "/admin/{model}/",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Registered model name"),
        ChangeListQuery
    ),
    responses(
        (status = 200, description = "Rows projected to the model's list columns", body = ChangeList),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Model not registered")
    )
)]
pub async fn change_list(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(query): Query<ChangeListQuery>,
) -> AppResult<Json<ChangeList>> {
    let filter = query.into_filter()?;
    let list = state.services.admin.change_list(&model, &filter).await?;
    Ok(Json(list))
}

pub async fn change_form(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> AppResult<Json<ChangeForm>> {
    let form = state.services.admin.change_form(&model, &id).await?;
    Ok(Json(form))
}

pub async fn create(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Map<String, Value>>)> {
    let row = state.services.admin.create(&model, body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> AppResult<Json<Map<String, Value>>> {
    let row = state.services.admin.update(&model, &id, body).await?;
    Ok(Json(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.services.admin.delete(&model, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a user account (superusers only)
#[utoipa::path(
    post,
    path = "/admin/users/",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input or login already exists"),
        (status = 403, description = "Superuser privileges required")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_superuser()?;
    user.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let created = state.services.users.create_user(&user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_list_query() {
        let filter = ChangeListQuery {
            status: Some("o".to_string()),
            due_back: Some("past_7_days".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.status, Some(LoanStatus::OnLoan));
        assert_eq!(filter.due_back, Some(DateFilter::PastSevenDays));

        let empty = ChangeListQuery {
            status: Some(String::new()),
            due_back: None,
        }
        .into_filter()
        .unwrap();
        assert_eq!(empty.status, None);

        assert!(ChangeListQuery {
            status: Some("x".to_string()),
            due_back: None,
        }
        .into_filter()
        .is_err());
    }
}
