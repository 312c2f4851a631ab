//! Author editing service

use crate::{
    error::AppResult,
    models::author::{Author, AuthorFields},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create(&self, fields: &AuthorFields) -> AppResult<Author> {
        let author = self.repository.authors.create(fields).await?;
        tracing::info!("Author {} created: {}", author.id, author);
        Ok(author)
    }

    pub async fn update(&self, id: i32, fields: &AuthorFields) -> AppResult<Author> {
        let author = self.repository.authors.update(id, fields).await?;
        tracing::info!("Author {} updated: {}", author.id, author);
        Ok(author)
    }

    /// Delete an author; their books survive without an author
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Author {} deleted", id);
        Ok(())
    }
}
