//! Generic staff administration over the registered catalog models

use chrono::Local;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    admin::{self, DateFilter, Fieldset, ModelAdmin},
    error::{AppError, AppResult},
    models::{
        author::AuthorFields,
        book::BookInput,
        book_instance::{BookInstanceInput, LoanStatus},
        genre::{display_genre, GenreInput},
        language::LanguageInput,
    },
    repository::{book_instances::InstanceFilter, Repository},
};

/// Registered model kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminModel {
    Genre,
    Language,
    Author,
    Book,
    BookInstance,
}

impl AdminModel {
    fn parse(model: &str) -> AppResult<(Self, &'static ModelAdmin)> {
        let registration = admin::lookup(model)?;
        let kind = match registration.model {
            "genre" => AdminModel::Genre,
            "language" => AdminModel::Language,
            "author" => AdminModel::Author,
            "book" => AdminModel::Book,
            "bookinstance" => AdminModel::BookInstance,
            other => return Err(AppError::NotFound(format!("Model {} is not registered", other))),
        };
        Ok((kind, registration))
    }
}

/// Filters accepted by the change list
#[derive(Debug, Default, Clone)]
pub struct ChangeListFilter {
    pub status: Option<LoanStatus>,
    pub due_back: Option<DateFilter>,
}

/// Rows of one model, projected to its `list_display` columns
#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeList {
    pub model: String,
    pub verbose_name: String,
    pub list_display: Vec<String>,
    pub list_filter: Vec<String>,
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<Map<String, Value>>,
}

/// One object with its fieldsets and inline dependents
#[derive(Debug, Serialize)]
pub struct ChangeForm {
    pub model: &'static str,
    pub object: Map<String, Value>,
    pub fieldsets: &'static [Fieldset],
    pub inlines: Map<String, Value>,
}

fn to_row<T: Serialize>(value: &T, display: String) -> AppResult<Map<String, Value>> {
    let mut row = match serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize admin row: {}", e)))?
    {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    row.insert("__str__".to_string(), Value::String(display));
    Ok(row)
}

/// Primary key of an admin row, as text
fn row_id(row: &Map<String, Value>) -> String {
    match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn parse_input<T: DeserializeOwned + Validate>(body: Value) -> AppResult<T> {
    let input: T = serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(input)
}

fn int_pk(id: &str) -> AppResult<i32> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("Object with id {} not found", id)))
}

fn uuid_pk(id: &str) -> AppResult<Uuid> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("Object with id {} not found", id)))
}

#[derive(Clone)]
pub struct AdminService {
    repository: Repository,
}

impl AdminService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub fn registry(&self) -> &'static [ModelAdmin] {
        admin::REGISTRY
    }

    /// Change list of a registered model
    pub async fn change_list(&self, model: &str, filter: &ChangeListFilter) -> AppResult<ChangeList> {
        let (kind, registration) = AdminModel::parse(model)?;
        let rows = self.rows(kind, filter).await?;

        let results: Vec<_> = rows
            .iter()
            .map(|row| admin::project(row, registration.list_display))
            .collect();

        Ok(ChangeList {
            model: registration.model.to_string(),
            verbose_name: registration.verbose_name.to_string(),
            list_display: registration.list_display.iter().map(|c| c.to_string()).collect(),
            list_filter: registration.list_filter.iter().map(|c| c.to_string()).collect(),
            count: results.len(),
            results,
        })
    }

    /// Change form of one object, with its inline dependents
    pub async fn change_form(&self, model: &str, id: &str) -> AppResult<ChangeForm> {
        let (kind, registration) = AdminModel::parse(model)?;
        let today = Local::now().date_naive();
        let mut inlines = Map::new();

        let object = match kind {
            AdminModel::Genre => {
                let genre = self.repository.genres.get_by_id(int_pk(id)?).await?;
                to_row(&genre, genre.to_string())?
            }
            AdminModel::Language => {
                let language = self.repository.languages.get_by_id(int_pk(id)?).await?;
                to_row(&language, language.to_string())?
            }
            AdminModel::Author => {
                let author = self.repository.authors.get_by_id(int_pk(id)?).await?;
                let books = self.repository.books.list_by_author(author.id).await?;
                inlines.insert("book".to_string(), serde_json::json!(books));
                to_row(&author, author.to_string())?
            }
            AdminModel::Book => {
                let book = self.repository.books.get_by_id(int_pk(id)?).await?;
                let genres = self.repository.genres.list_for_book(book.id).await?;
                let filter = InstanceFilter {
                    book_id: Some(book.id),
                    ..Default::default()
                };
                let instances: Vec<_> = self
                    .repository
                    .book_instances
                    .list(&filter, None, 0)
                    .await?
                    .iter()
                    .map(|i| i.summary(today))
                    .collect();
                inlines.insert("bookinstance".to_string(), serde_json::json!(instances));

                let mut row = to_row(&book, book.to_string())?;
                row.insert("genre".to_string(), serde_json::json!(genres));
                row
            }
            AdminModel::BookInstance => {
                let instance = self.repository.book_instances.get_by_id(uuid_pk(id)?).await?;
                to_row(&instance, instance.to_string())?
            }
        };

        Ok(ChangeForm {
            model: registration.model,
            object,
            fieldsets: registration.fieldsets,
            inlines,
        })
    }

    pub async fn create(&self, model: &str, body: Value) -> AppResult<Map<String, Value>> {
        let (kind, registration) = AdminModel::parse(model)?;

        let row = match kind {
            AdminModel::Genre => {
                let genre = self.repository.genres.create(&parse_input::<GenreInput>(body)?).await?;
                to_row(&genre, genre.to_string())?
            }
            AdminModel::Language => {
                let input = parse_input::<LanguageInput>(body)?;
                let language = self.repository.languages.create(&input).await?;
                to_row(&language, language.to_string())?
            }
            AdminModel::Author => {
                let author = self.repository.authors.create(&parse_input::<AuthorFields>(body)?).await?;
                to_row(&author, author.to_string())?
            }
            AdminModel::Book => {
                let book = self.repository.books.create(&parse_input::<BookInput>(body)?).await?;
                to_row(&book, book.to_string())?
            }
            AdminModel::BookInstance => {
                let input = parse_input::<BookInstanceInput>(body)?;
                let instance = self.repository.book_instances.create(&input).await?;
                to_row(&instance, instance.to_string())?
            }
        };

        let id = row_id(&row);
        tracing::info!("Admin created {} {}", registration.model, id);
        Ok(row)
    }

    pub async fn update(&self, model: &str, id: &str, body: Value) -> AppResult<Map<String, Value>> {
        let (kind, registration) = AdminModel::parse(model)?;

        let row = match kind {
            AdminModel::Genre => {
                let input = parse_input::<GenreInput>(body)?;
                let genre = self.repository.genres.update(int_pk(id)?, &input).await?;
                to_row(&genre, genre.to_string())?
            }
            AdminModel::Language => {
                let input = parse_input::<LanguageInput>(body)?;
                let language = self.repository.languages.update(int_pk(id)?, &input).await?;
                to_row(&language, language.to_string())?
            }
            AdminModel::Author => {
                let input = parse_input::<AuthorFields>(body)?;
                let author = self.repository.authors.update(int_pk(id)?, &input).await?;
                to_row(&author, author.to_string())?
            }
            AdminModel::Book => {
                let input = parse_input::<BookInput>(body)?;
                let book = self.repository.books.update(int_pk(id)?, &input).await?;
                to_row(&book, book.to_string())?
            }
            AdminModel::BookInstance => {
                let input = parse_input::<BookInstanceInput>(body)?;
                let instance = self.repository.book_instances.update(uuid_pk(id)?, &input).await?;
                to_row(&instance, instance.to_string())?
            }
        };

        tracing::info!("Admin updated {} {}", registration.model, id);
        Ok(row)
    }

    pub async fn delete(&self, model: &str, id: &str) -> AppResult<()> {
        let (kind, registration) = AdminModel::parse(model)?;

        match kind {
            AdminModel::Genre => self.repository.genres.delete(int_pk(id)?).await?,
            AdminModel::Language => self.repository.languages.delete(int_pk(id)?).await?,
            AdminModel::Author => self.repository.authors.delete(int_pk(id)?).await?,
            AdminModel::Book => self.repository.books.delete(int_pk(id)?).await?,
            AdminModel::BookInstance => self.repository.book_instances.delete(uuid_pk(id)?).await?,
        }

        tracing::info!("Admin deleted {} {}", registration.model, id);
        Ok(())
    }

    /// Every row of a model with its display columns filled in
    async fn rows(&self, kind: AdminModel, filter: &ChangeListFilter) -> AppResult<Vec<Map<String, Value>>> {
        match kind {
            AdminModel::Genre => self
                .repository
                .genres
                .list()
                .await?
                .iter()
                .map(|g| to_row(g, g.to_string()))
                .collect(),
            AdminModel::Language => self
                .repository
                .languages
                .list()
                .await?
                .iter()
                .map(|l| to_row(l, l.to_string()))
                .collect(),
            AdminModel::Author => self
                .repository
                .authors
                .list()
                .await?
                .iter()
                .map(|a| to_row(a, a.to_string()))
                .collect(),
            AdminModel::Book => {
                let genres = self.repository.books.genres_by_book().await?;
                let books = self.repository.books.list_summaries(None, 0).await?;

                books
                    .iter()
                    .map(|book| {
                        let mut row = to_row(book, book.title.clone())?;
                        row.insert(
                            "author".to_string(),
                            book.author
                                .as_ref()
                                .map(|a| Value::String(a.name.clone()))
                                .unwrap_or(Value::Null),
                        );
                        let book_genres = genres.get(&book.id).map(Vec::as_slice).unwrap_or(&[]);
                        row.insert(
                            "display_genre".to_string(),
                            Value::String(display_genre(book_genres)),
                        );
                        Ok(row)
                    })
                    .collect()
            }
            AdminModel::BookInstance => {
                let today = Local::now().date_naive();
                let mut instance_filter = InstanceFilter {
                    status: filter.status,
                    ..Default::default()
                };
                if let Some(due_back) = filter.due_back {
                    let (from, to) = due_back.bounds(today);
                    instance_filter.due_from = from;
                    instance_filter.due_to = to;
                    instance_filter.has_due_back = due_back.requires_date();
                }

                self.repository
                    .book_instances
                    .list(&instance_filter, None, 0)
                    .await?
                    .iter()
                    .map(|instance| {
                        let mut row = to_row(instance, instance.to_string())?;
                        row.insert("book".to_string(), serde_json::json!(instance.book_title));
                        row.insert(
                            "status".to_string(),
                            Value::String(instance.status.label().to_string()),
                        );
                        row.insert("borrower".to_string(), serde_json::json!(instance.borrower_login));
                        Ok(row)
                    })
                    .collect()
            }
        }
    }
}
