//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, authors, catalog, health, loans};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Library catalog: books, authors, copies and loans"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        catalog::index,
        catalog::book_list,
        catalog::book_detail,
        catalog::author_list,
        catalog::author_detail,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renew_form,
        loans::renew_submit,
        // Authors
        authors::create_form,
        authors::create_submit,
        authors::update_form,
        authors::update_submit,
        authors::delete_form,
        authors::delete_submit,
        // Admin
        admin::change_list,
        admin::create_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::UserClaims,
            crate::models::user::User,
            crate::models::user::CreateUser,
            // Catalog
            catalog::IndexResponse,
            crate::services::catalog::CatalogCounts,
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::author::Author,
            crate::models::author::AuthorSummary,
            crate::models::author::AuthorDetail,
            crate::models::genre::Genre,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::InstanceSummary,
            crate::models::pagination::BookPage,
            crate::models::pagination::InstancePage,
            // Forms
            loans::RenewFormResponse,
            crate::forms::RenewBookSubmission,
            authors::AuthorFormResponse,
            authors::AuthorDeleteResponse,
            crate::forms::AuthorSubmission,
            // Admin
            crate::services::admin::ChangeList,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Books and authors"),
        (name = "loans", description = "Borrowed copies and renewals"),
        (name = "authors", description = "Author editing"),
        (name = "admin", description = "Staff administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalog_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/book/{id}/renew/"));
        assert!(doc.paths.paths.contains_key("/borrowed"));
    }
}
