//! Borrowed-book listings and loan renewal

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Local;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    forms::{FieldErrors, RenewBookForm, RenewBookSubmission},
    models::{
        book_instance::InstanceSummary,
        pagination::{Page, PageQuery},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Where a successful renewal lands
pub const RENEW_SUCCESS_URL: &str = "/borrowed";

/// Renewal form context, for the initial GET and for rejected submissions
#[derive(Serialize, ToSchema)]
pub struct RenewFormResponse {
    pub book_instance: InstanceSummary,
    pub form: RenewBookSubmission,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Current user's loans", body = InstancePage),
        (status = 302, description = "Not logged in")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<InstanceSummary>>> {
    let page = state
        .services
        .loans
        .borrowed_by_user(claims.user_id, query.page.as_deref())
        .await?;
    Ok(Json(page))
}

/// Every copy currently on loan
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans", body = InstancePage),
        (status = 302, description = "Not logged in"),
        (status = 403, description = "Missing can_mark_returned permission")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<InstanceSummary>>> {
    let page = state.services.loans.all_borrowed(query.page.as_deref()).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal form proposing three weeks from today", body = RenewFormResponse),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewFormResponse>> {
    let today = Local::now().date_naive();
    let instance = state.services.loans.get_instance(id).await?;
    let proposed = RenewBookForm::proposed(today);

    Ok(Json(RenewFormResponse {
        book_instance: instance.summary(today),
        form: RenewBookSubmission {
            renewal_date: Some(proposed.renewal_date.format("%Y-%m-%d").to_string()),
        },
        errors: FieldErrors::new(),
    }))
}

/// Submit a new due date for a borrowed copy
#[utoipa::path(
    post,
    path = "/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body(content = RenewBookSubmission, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Renewed, redirect to the borrowed list"),
        (status = 400, description = "Invalid renewal date", body = RenewFormResponse),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(submission): Form<RenewBookSubmission>,
) -> AppResult<Response> {
    let instance = state.services.loans.get_instance(id).await?;

    match RenewBookForm::bind(&submission) {
        Ok(form) => {
            state.services.loans.renew(instance.id, form).await?;
            Ok(Redirect::to(RENEW_SUCCESS_URL).into_response())
        }
        Err(errors) => {
            let today = Local::now().date_naive();
            let body = RenewFormResponse {
                book_instance: instance.summary(today),
                form: submission,
                errors,
            };
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}
