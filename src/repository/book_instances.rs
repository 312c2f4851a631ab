//! Book instances repository

use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, query::QueryAs, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceInput, LoanStatus},
};

use super::map_reference_error;

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id, bi.status,
           b.title AS book_title, u.login AS borrower_login
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// Row filter for instance listings; unset fields match everything
#[derive(Debug, Default, Clone)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub book_id: Option<i32>,
    pub borrower_id: Option<i32>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub has_due_back: Option<bool>,
}

impl InstanceFilter {
    pub fn on_loan() -> Self {
        Self {
            status: Some(LoanStatus::OnLoan),
            ..Default::default()
        }
    }

    pub fn on_loan_to(borrower_id: i32) -> Self {
        Self {
            borrower_id: Some(borrower_id),
            ..Self::on_loan()
        }
    }

    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        let mut idx = 1;
        let mut next = || {
            let placeholder = format!("${}", idx);
            idx += 1;
            placeholder
        };

        if self.status.is_some() {
            conditions.push(format!("bi.status = {}", next()));
        }
        if self.book_id.is_some() {
            conditions.push(format!("bi.book_id = {}", next()));
        }
        if self.borrower_id.is_some() {
            conditions.push(format!("bi.borrower_id = {}", next()));
        }
        if self.due_from.is_some() {
            conditions.push(format!("bi.due_back >= {}", next()));
        }
        if self.due_to.is_some() {
            conditions.push(format!("bi.due_back <= {}", next()));
        }
        match self.has_due_back {
            Some(true) => conditions.push("bi.due_back IS NOT NULL".to_string()),
            Some(false) => conditions.push("bi.due_back IS NULL".to_string()),
            None => {}
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    fn placeholders(&self) -> usize {
        [
            self.status.is_some(),
            self.book_id.is_some(),
            self.borrower_id.is_some(),
            self.due_from.is_some(),
            self.due_to.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    fn bind<'q, O>(
        &self,
        mut builder: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        if let Some(status) = self.status {
            builder = builder.bind(status);
        }
        if let Some(book_id) = self.book_id {
            builder = builder.bind(book_id);
        }
        if let Some(borrower_id) = self.borrower_id {
            builder = builder.bind(borrower_id);
        }
        if let Some(due_from) = self.due_from {
            builder = builder.bind(due_from);
        }
        if let Some(due_to) = self.due_to {
            builder = builder.bind(due_to);
        }
        builder
    }
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Count instances matching a filter
    pub async fn count(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM book_instances bi {}",
            filter.where_clause()
        );
        let (count,): (i64,) = filter
            .bind(sqlx::query_as::<_, (i64,)>(&query))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List instances matching a filter, ordered by due date (undated last).
    /// A `None` limit returns every row.
    pub async fn list(
        &self,
        filter: &InstanceFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> AppResult<Vec<BookInstance>> {
        let n = filter.placeholders();
        let query = format!(
            "{} {} ORDER BY bi.due_back ASC NULLS LAST, bi.id LIMIT ${} OFFSET ${}",
            INSTANCE_SELECT,
            filter.where_clause(),
            n + 1,
            n + 2
        );

        let rows = filter
            .bind(sqlx::query_as::<_, BookInstance>(&query))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("{} WHERE bi.id = $1", INSTANCE_SELECT);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Set the due date of one instance; last write wins
    pub async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $2 WHERE id = $1")
            .bind(id)
            .bind(due_back)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    pub async fn create(&self, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let id = data.id.unwrap_or_else(Uuid::new_v4);

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.borrower_id)
        .bind(data.status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "Unknown book or borrower"))?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: Uuid, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, due_back = $4, borrower_id = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.borrower_id)
        .bind(data.status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error(e, "Unknown book or borrower"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}
