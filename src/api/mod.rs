//! HTTP handlers for the Local Library catalog

pub mod admin;
pub mod auth;
pub mod authors;
pub mod catalog;
pub mod guards;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for the authenticated user.
///
/// Claims already verified by a route guard are reused; otherwise the
/// `Authorization: Bearer` header is checked. Anonymous requests are sent to
/// the login page.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<UserClaims>() {
            return Ok(AuthenticatedUser(claims.clone()));
        }

        match bearer_claims(&parts.headers, &state.config.auth.jwt_secret)? {
            Some(claims) => Ok(AuthenticatedUser(claims)),
            None => Err(login_redirect(&state.config.auth.login_url, &parts.uri)),
        }
    }
}

/// Decode the bearer token, if any. A present but invalid token is an error,
/// not an anonymous request.
pub(crate) fn bearer_claims(headers: &HeaderMap, secret: &str) -> Result<Option<UserClaims>, AppError> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    UserClaims::from_token(token, secret)
        .map(Some)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

/// Redirect to the login page, remembering where the visitor was going
pub(crate) fn login_redirect(login_url: &str, uri: &Uri) -> AppError {
    AppError::LoginRequired(format!("{}?next={}", login_url, uri.path()))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/", get(catalog::index))
        .route("/books/", get(catalog::book_list))
        .route("/book/:id/", get(catalog::book_detail))
        .route("/authors/", get(catalog::author_list))
        .route("/author/:id/", get(catalog::author_detail))
        .route("/accounts/login/", post(auth::login))
        .route("/accounts/me/", get(auth::me))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check));

    let members = Router::new()
        .route("/mybooks/", get(loans::my_borrowed))
        .route_layer(middleware::from_fn_with_state(state.clone(), guards::login_required));

    let librarians = Router::new()
        .route("/borrowed", get(loans::all_borrowed))
        .route(
            "/book/:id/renew/",
            get(loans::renew_form).post(loans::renew_submit),
        )
        .route(
            "/author/create/",
            get(authors::create_form).post(authors::create_submit),
        )
        .route(
            "/author/:id/update/",
            get(authors::update_form).post(authors::update_submit),
        )
        .route(
            "/author/:id/delete/",
            get(authors::delete_form).post(authors::delete_submit),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), guards::can_mark_returned))
        .route_layer(middleware::from_fn_with_state(state.clone(), guards::login_required));

    let staff = Router::new()
        .route("/admin/", get(admin::index))
        .route("/admin/users/", post(admin::create_user))
        .route(
            "/admin/:model/",
            get(admin::change_list).post(admin::create),
        )
        .route(
            "/admin/:model/:id/",
            get(admin::change_form).put(admin::update).delete(admin::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), guards::staff_required));

    Router::new()
        .merge(public)
        .merge(members)
        .merge(librarians)
        .merge(staff)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
