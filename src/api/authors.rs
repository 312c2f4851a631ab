//! Author create / update / delete forms

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    forms::{AuthorForm, AuthorSubmission, FieldErrors},
    models::author::Author,
    AppState,
};

/// Where a deleted author's visitor is sent
pub const AUTHOR_DELETE_SUCCESS_URL: &str = "/authors/";

/// Author form context
#[derive(Serialize, ToSchema)]
pub struct AuthorFormResponse {
    /// Author being edited, absent on create
    pub author: Option<Author>,
    pub form: AuthorSubmission,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Delete confirmation context
#[derive(Serialize, ToSchema)]
pub struct AuthorDeleteResponse {
    pub author: Author,
    pub display: String,
}

fn rejected(author: Option<Author>, form: AuthorSubmission, errors: FieldErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(AuthorFormResponse { author, form, errors }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Blank author form", body = AuthorFormResponse),
        (status = 403, description = "Missing can_mark_returned permission")
    )
)]
pub async fn create_form() -> Json<AuthorFormResponse> {
    Json(AuthorFormResponse {
        author: None,
        form: AuthorForm::initial(),
        errors: FieldErrors::new(),
    })
}

#[utoipa::path(
    post,
    path = "/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body(content = AuthorSubmission, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirect to the author page"),
        (status = 400, description = "Invalid form", body = AuthorFormResponse),
        (status = 403, description = "Missing can_mark_returned permission")
    )
)]
pub async fn create_submit(
    State(state): State<AppState>,
    Form(submission): Form<AuthorSubmission>,
) -> AppResult<Response> {
    let fields = match AuthorForm::bind(&submission) {
        Ok(fields) => fields,
        Err(errors) => return Ok(rejected(None, submission, errors)),
    };

    let author = state.services.authors.create(&fields).await?;
    Ok(Redirect::to(&author.url()).into_response())
}

#[utoipa::path(
    get,
    path = "/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author form pre-filled from the record", body = AuthorFormResponse),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorFormResponse>> {
    let author = state.services.authors.get(id).await?;
    let form = AuthorSubmission::from(&author.fields());

    Ok(Json(AuthorFormResponse {
        author: Some(author),
        form,
        errors: FieldErrors::new(),
    }))
}

#[utoipa::path(
    post,
    path = "/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body(content = AuthorSubmission, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirect to the author page"),
        (status = 400, description = "Invalid form", body = AuthorFormResponse),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_submit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(submission): Form<AuthorSubmission>,
) -> AppResult<Response> {
    let author = state.services.authors.get(id).await?;

    let fields = match AuthorForm::bind(&submission) {
        Ok(fields) => fields,
        Err(errors) => return Ok(rejected(Some(author), submission, errors)),
    };

    let author = state.services.authors.update(author.id, &fields).await?;
    Ok(Redirect::to(&author.url()).into_response())
}

#[utoipa::path(
    get,
    path = "/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Delete confirmation", body = AuthorDeleteResponse),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDeleteResponse>> {
    let author = state.services.authors.get(id).await?;
    Ok(Json(AuthorDeleteResponse {
        display: author.to_string(),
        author,
    }))
}

/// Delete the author; their books are kept without an author
#[utoipa::path(
    post,
    path = "/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the author list"),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_submit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.authors.delete(id).await?;
    Ok(Redirect::to(AUTHOR_DELETE_SUCCESS_URL))
}
