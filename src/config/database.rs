//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint the entities cannot
//! express, the (user, menu item) uniqueness of reviews, is added as an explicit index.

use crate::entities::{
    Address, Booking, MenuItem, Order, OrderItem, Review, Settings, User, review,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;

/// Default location of the database when neither `DATABASE_URL` nor `MONGODB_URI` is set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/bistro.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
///
/// `DATABASE_URL` wins; `MONGODB_URI` is accepted as a legacy name for the same setting.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("MONGODB_URI"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file(database_url).and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_file(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// Creates all tables (if missing) and the review uniqueness index.
///
/// Tables are created parents first so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Address).await?;
    create_table(db, &schema, MenuItem).await?;
    create_table(db, &schema, Review).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, Booking).await?;
    create_table(db, &schema, Settings).await?;

    let review_pair = Index::create()
        .name("idx_reviews_user_menu_item")
        .table(Review)
        .col(review::Column::UserId)
        .col(review::Column::MenuItemId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&review_pair)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}
