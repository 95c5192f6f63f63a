use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use tokio::fs;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create the raw sqlx pool used for audit writes and aggregate queries.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<OrmConn> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Directory holding the SQL migrations, resolved against the working directory.
pub const MIGRATIONS_DIR: &str = "migrations";

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
/// Every statement in those files is written to be re-runnable.
pub async fn run_migrations(conn: &OrmConn) -> Result<()> {
    let files = migration_files(Path::new(MIGRATIONS_DIR)).await?;

    let backend = conn.get_database_backend();
    for file in files {
        tracing::debug!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(&file).await?;
        for statement in split_statements(&sql) {
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
    }

    Ok(())
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read migrations from {}", dir.display()))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// Postgres prepared statements cannot contain multiple commands.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(|stmt| format!("{stmt};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_found_relative_to_the_working_directory() {
        assert!(Path::new(MIGRATIONS_DIR).is_relative());
        let files = migration_files(Path::new(MIGRATIONS_DIR)).await.unwrap();
        assert!(files.iter().any(|f| f.ends_with("0001_init.sql")));
        assert!(files.iter().all(|f| f.starts_with(MIGRATIONS_DIR)));
    }

    #[tokio::test]
    async fn missing_migrations_dir_is_an_error() {
        assert!(migration_files(Path::new("no-such-migrations")).await.is_err());
    }

    #[test]
    fn statements_are_split_and_terminated() {
        let sql = "CREATE TABLE a (id INT);\n\n  CREATE INDEX b ON a (id) ;\n";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (id INT);", "CREATE INDEX b ON a (id);"]
        );
    }
}
