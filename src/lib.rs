//! Local Library catalog server
//!
//! A small library catalog over a JSON HTTP API: books, authors, genres,
//! loanable copies and their borrowers, with librarian renewal and a staff
//! administration interface.

use std::sync::Arc;

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
