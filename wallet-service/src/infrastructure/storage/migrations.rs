//! Schema migrations, read at runtime from a directory of
//! `<version>_<name>.up.sql` / `.down.sql` files.

use sqlx::migrate::{Migrate, Migrator};
use sqlx::PgPool;
use std::path::Path;

use crate::domain::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    /// The last migration started but did not finish.
    pub dirty: bool,
}

pub async fn load(migrations_path: impl AsRef<Path>) -> Result<Migrator, StoreError> {
    let migrator = Migrator::new(migrations_path.as_ref()).await?;
    Ok(migrator)
}

/// Apply every pending migration. Already-applied migrations are a no-op.
pub async fn apply(pool: &PgPool, migrations_path: impl AsRef<Path>) -> Result<(), StoreError> {
    let migrator = load(migrations_path).await?;
    migrator.run(pool).await?;
    Ok(())
}

/// Revert every applied migration.
pub async fn revert_all(pool: &PgPool, migrations_path: impl AsRef<Path>) -> Result<(), StoreError> {
    let migrator = load(migrations_path).await?;
    migrator.undo(pool, 0).await?;
    Ok(())
}

/// Current schema version, `None` when nothing has been applied yet.
pub async fn status(pool: &PgPool) -> Result<Option<MigrationStatus>, StoreError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;

    if let Some(version) = conn.dirty_version().await? {
        return Ok(Some(MigrationStatus { version, dirty: true }));
    }

    let applied = conn.list_applied_migrations().await?;
    Ok(applied
        .iter()
        .map(|migration| migration.version)
        .max()
        .map(|version| MigrationStatus { version, dirty: false }))
}
