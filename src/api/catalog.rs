//! Public catalog pages: home, books and authors

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail},
        book::{BookDetail, BookSummary},
        pagination::{Page, PageQuery},
    },
    services::catalog::CatalogCounts,
    AppState,
};

/// Home page context
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits to the home page by this session before the current one
    pub num_visits: u64,
}

/// Home page with catalog counts and the session visit counter
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let session = &state.config.session;

    let (jar, session_id) = match jar.get(&session.cookie_name).map(|c| c.value().to_string()) {
        Some(session_id) => (jar, session_id),
        None => {
            let session_id = Uuid::new_v4().to_string();
            let cookie = session_cookie(
                session.cookie_name.clone(),
                session_id.clone(),
                session.max_age_seconds,
            );
            (jar.add(cookie), session_id)
        }
    };

    // A failed page view must not count as a visit
    let counts = state.services.catalog.counts().await?;
    let num_visits = state
        .services
        .sessions
        .increment(&session_id, "num_visits")
        .await?;

    Ok((jar, Json(IndexResponse { counts, num_visits })))
}

/// Session cookie living as long as the stored session
pub(crate) fn session_cookie(name: String, session_id: String, max_age_seconds: u64) -> Cookie<'static> {
    let max_age = i64::try_from(max_age_seconds).unwrap_or(i64::MAX);
    Cookie::build((name, session_id))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Paginated list of books
#[utoipa::path(
    get,
    path = "/books/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn book_list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page.as_deref()).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/book/{id}/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.book_detail(id).await?;
    Ok(Json(book))
}

#[utoipa::path(
    get,
    path = "/authors/",
    tag = "catalog",
    responses(
        (status = 200, description = "All authors", body = Vec<Author>)
    )
)]
pub async fn author_list(State(state): State<AppState>) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

#[utoipa::path(
    get,
    path = "/author/{id}/",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author with their books", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.author_detail(id).await?;
    Ok(Json(author))
}
