//! Database module: models, schema and stores for the local catalogue.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL applied at startup
//! - `tags.rs`: tag lifecycle (`TagStore`)
//! - `images.rs`: image rows and their tag associations (`ImageStore`)

pub mod images;
pub mod models;
pub mod schema;
pub mod tags;

pub use images::ImageStore;
pub use models::{DbImage, ImageRecord, Tag};
pub use schema::SQLITE_INIT;
pub use tags::TagStore;

use crate::error::OukaError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and apply the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, OukaError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    if let Some(parent) = connect_opts.get_filename().parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    info!(database_url, "database ready");
    Ok(pool)
}

/// Execute the bundled DDL one statement at a time.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), OukaError> {
    // sqlx::query runs a single statement
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
