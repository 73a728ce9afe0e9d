pub mod ai_sql;
pub mod cli;
pub mod config;
pub mod database;
pub mod database_mysql;
pub mod history;
pub mod logging;
pub mod password_sanitizer;
pub mod server;

pub use config::Config;
pub use database::{DatabaseClient, DatabaseError, HistoryRecord, Row};
pub use server::{AppState, router};
