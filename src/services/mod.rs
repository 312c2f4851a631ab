//! Business logic services

pub mod admin;
pub mod authors;
pub mod catalog;
pub mod loans;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository};

use self::sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub authors: authors::AuthorsService,
    pub users: users::UsersService,
    pub admin: admin::AdminService,
    pub sessions: Arc<dyn SessionStore>,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            admin: admin::AdminService::new(repository.clone()),
            sessions,
            repository,
        }
    }
}
