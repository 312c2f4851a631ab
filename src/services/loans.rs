//! Loan service: borrowed-copy listings and due date renewal

use chrono::Local;
use uuid::Uuid;

use crate::{
    error::AppResult,
    forms::RenewBookForm,
    models::{
        book_instance::{BookInstance, InstanceSummary},
        pagination::{Page, PageWindow},
    },
    repository::{book_instances::InstanceFilter, Repository},
};

pub const LOANS_PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn borrowed_by_user(&self, user_id: i32, page: Option<&str>) -> AppResult<Page<InstanceSummary>> {
        self.on_loan_page(&InstanceFilter::on_loan_to(user_id), page).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, page: Option<&str>) -> AppResult<Page<InstanceSummary>> {
        self.on_loan_page(&InstanceFilter::on_loan(), page).await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await
    }

    /// Persist a validated renewal date
    pub async fn renew(&self, id: Uuid, form: RenewBookForm) -> AppResult<()> {
        self.repository
            .book_instances
            .update_due_back(id, form.renewal_date)
            .await?;
        tracing::info!("Book instance {} renewed until {}", id, form.renewal_date);
        Ok(())
    }

    async fn on_loan_page(
        &self,
        filter: &InstanceFilter,
        page: Option<&str>,
    ) -> AppResult<Page<InstanceSummary>> {
        let count = self.repository.book_instances.count(filter).await?;
        let window = PageWindow::resolve(page, count, LOANS_PER_PAGE)?;
        let rows = self
            .repository
            .book_instances
            .list(filter, Some(window.limit()), window.offset())
            .await?;

        let today = Local::now().date_naive();
        Ok(window.into_page(rows.iter().map(|i| i.summary(today)).collect()))
    }
}
