//! Route guards, run before the handler of every route they wrap

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::{UserClaims, CAN_MARK_RETURNED},
    AppState,
};

use super::{bearer_claims, login_redirect};

/// Verify the caller's token once and keep the claims on the request
fn authenticate(state: &AppState, request: &mut Request) -> Result<UserClaims, AppError> {
    if let Some(claims) = request.extensions().get::<UserClaims>() {
        return Ok(claims.clone());
    }

    let claims = bearer_claims(request.headers(), &state.config.auth.jwt_secret)?
        .ok_or_else(|| login_redirect(&state.config.auth.login_url, request.uri()))?;

    request.extensions_mut().insert(claims.clone());
    Ok(claims)
}

/// Anonymous visitors are redirected to the login page
pub async fn login_required(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, &mut request)?;
    Ok(next.run(request).await)
}

/// Librarian views: anonymous visitors are redirected, users lacking the
/// permission are refused
pub async fn can_mark_returned(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &mut request)?;
    claims.require_perm(CAN_MARK_RETURNED)?;
    Ok(next.run(request).await)
}

pub async fn staff_required(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &mut request)?;
    claims.require_staff()?;
    Ok(next.run(request).await)
}
