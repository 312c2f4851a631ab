//! Catalog browsing service: home page counts, books and authors

use chrono::Local;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail},
        book::{BookDetail, BookSummary},
        book_instance::{InstanceSummary, LoanStatus},
        pagination::{Page, PageWindow},
    },
    repository::{book_instances::InstanceFilter, Repository},
};

pub const BOOKS_PER_PAGE: i64 = 2;

/// Catalog totals shown on the home page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let available = InstanceFilter {
            status: Some(LoanStatus::Available),
            ..Default::default()
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count(&InstanceFilter::default()).await?,
            num_instances_available: self.repository.book_instances.count(&available).await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
        })
    }

    /// One page of the book list
    pub async fn list_books(&self, page: Option<&str>) -> AppResult<Page<BookSummary>> {
        let count = self.repository.books.count().await?;
        let window = PageWindow::resolve(page, count, BOOKS_PER_PAGE)?;
        let books = self
            .repository
            .books
            .list_summaries(Some(window.limit()), window.offset())
            .await?;
        Ok(window.into_page(books))
    }

    pub async fn book_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let genres = self.repository.genres.list_for_book(id).await?;

        let today = Local::now().date_naive();
        let own = InstanceFilter {
            book_id: Some(id),
            ..Default::default()
        };
        let instances = self.summaries(&own, today).await?;
        let all_instances = self.summaries(&InstanceFilter::default(), today).await?;

        Ok(BookDetail::new(book, author.as_ref(), genres, instances, all_instances))
    }

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn author_detail(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail {
            display: author.to_string(),
            author,
            books,
        })
    }

    async fn summaries(
        &self,
        filter: &InstanceFilter,
        today: chrono::NaiveDate,
    ) -> AppResult<Vec<InstanceSummary>> {
        let instances = self.repository.book_instances.list(filter, None, 0).await?;
        Ok(instances.iter().map(|i| i.summary(today)).collect())
    }
}
