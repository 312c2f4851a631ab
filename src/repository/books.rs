//! Books repository

use std::collections::HashMap;

use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookInput, BookListRow, BookSummary},
        genre::Genre,
    },
};

use super::map_reference_error;

const BOOK_COLUMNS: &str = "id, title, author_id, summary, isbn";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List books with their author, ordered by id. A `None` limit returns every row.
    pub async fn list_summaries(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<BookSummary>> {
        let rows = sqlx::query_as::<_, BookListRow>(
            r#"
            SELECT b.id, b.title, b.author_id,
                   a.first_name AS author_first_name, a.last_name AS author_last_name
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            ORDER BY b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Books written by an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books WHERE author_id = $1 ORDER BY id",
            BOOK_COLUMNS
        );
        let rows = sqlx::query_as::<_, Book>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Genres of every book, keyed by book id
    pub async fn genres_by_book(&self) -> AppResult<HashMap<i32, Vec<Genre>>> {
        let rows = sqlx::query(
            r#"
            SELECT bg.book_id, g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            ORDER BY bg.book_id, g.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_book: HashMap<i32, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_book.entry(row.get("book_id")).or_default().push(Genre {
                id: row.get("id"),
                name: row.get("name"),
            });
        }
        Ok(by_book)
    }

    pub async fn create(&self, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO books (title, author_id, summary, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(data.author_id)
            .bind(&data.summary)
            .bind(&data.isbn)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_reference_error(e, "Unknown author"))?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(book.id)
        .bind(data.unique_genre_ids())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_reference_error(e, "Unknown genre"))?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn update(&self, id: i32, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            UPDATE books SET title = $2, author_id = $3, summary = $4, isbn = $5
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&data.title)
            .bind(data.author_id)
            .bind(&data.summary)
            .bind(&data.isbn)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_reference_error(e, "Unknown author"))?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(data.unique_genre_ids())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_reference_error(e, "Unknown genre"))?;

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book. Its copies keep existing with the book reference cleared.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
