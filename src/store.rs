//! The persistent document store.
//!
//! A single SQLite table maps a document's absolute path to its normalized
//! content plus bookkeeping timestamps. Upserts are staleness-gated so
//! indexing is idempotent; substring queries run against a [`Predicate`]
//! tree translated once into parameterized SQL.

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use crate::models::{IndexedDocument, UpsertOutcome};

/// Substring predicate over the `content` column.
///
/// Built by the query layer from the raw query string; `Literal` holds the
/// bare substring (the `%` wildcards are added during translation, and the
/// value is always bound, never interpolated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Literal(String),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Translates the tree into a WHERE clause plus its bind parameters.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut clause = String::new();
        let mut params = Vec::new();
        self.write_sql(&mut clause, &mut params);
        (clause, params)
    }

    fn write_sql(&self, out: &mut String, params: &mut Vec<String>) {
        match self {
            Predicate::Literal(s) => {
                out.push_str("content LIKE ?");
                params.push(format!("%{}%", s));
            }
            Predicate::All(children) => Self::write_group(out, params, children, " AND "),
            Predicate::Any(children) => Self::write_group(out, params, children, " OR "),
        }
    }

    fn write_group(out: &mut String, params: &mut Vec<String>, children: &[Predicate], sep: &str) {
        if children.is_empty() {
            // An empty group matches everything.
            out.push_str("1=1");
            return;
        }
        out.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            child.write_sql(out, params);
        }
        out.push(')');
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Opens the store at `index_path`, creating file and schema if absent.
    pub async fn open(index_path: &Path) -> Result<Self> {
        let pool = connect(index_path).await?;
        migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stored modification time for `path`, if a row exists. The indexer
    /// probes this before deciding whether extraction is needed at all.
    pub async fn last_modified_in(
        conn: &mut SqliteConnection,
        path: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT last_modified FROM documents WHERE path = ?")
            .bind(path)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Inserts a new row, updates an existing row whose stored
    /// `last_modified` is strictly older than `modified_at`, or does
    /// nothing. Safe to re-run; `created_at` is never touched on update.
    pub async fn upsert_if_stale_in(
        conn: &mut SqliteConnection,
        path: &str,
        content: &str,
        modified_at: i64,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let existing = Self::last_modified_in(conn, path).await?;
        let now = Utc::now().timestamp();

        match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (path, content, last_modified, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(path)
                .bind(content)
                .bind(modified_at)
                .bind(now)
                .bind(now)
                .execute(&mut *conn)
                .await?;
                Ok(UpsertOutcome::Inserted)
            }
            Some(stored) if stored < modified_at => {
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET content = ?, last_modified = ?, updated_at = ?
                    WHERE path = ?
                    "#,
                )
                .bind(content)
                .bind(modified_at)
                .bind(now)
                .bind(path)
                .execute(&mut *conn)
                .await?;
                Ok(UpsertOutcome::Updated)
            }
            Some(_) => Ok(UpsertOutcome::Skipped),
        }
    }

    /// Pool-connection convenience for [`Self::upsert_if_stale_in`].
    pub async fn upsert_if_stale(
        &self,
        path: &str,
        content: &str,
        modified_at: i64,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_if_stale_in(&mut conn, path, content, modified_at).await
    }

    /// Returns every row whose content satisfies `predicate`, capped at
    /// `limit`, in storage order. No relevance ordering.
    pub async fn query_contains(
        &self,
        predicate: &Predicate,
        limit: i64,
    ) -> Result<Vec<IndexedDocument>, sqlx::Error> {
        let (clause, params) = predicate.to_sql();
        let sql = format!(
            "SELECT path, content, last_modified, created_at, updated_at \
             FROM documents WHERE {clause} LIMIT ?"
        );

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        query = query.bind(limit);

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    pub async fn get(&self, path: &str) -> Result<Option<IndexedDocument>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT path, content, last_modified, created_at, updated_at \
             FROM documents WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_document))
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> IndexedDocument {
    IndexedDocument {
        path: row.get("path"),
        content: row.get("content"),
        last_modified: row.get("last_modified"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Opens the index store file, creating it (and its parent directory) if
/// absent. WAL mode lets queries read concurrently while an indexing run's
/// write transaction is in progress.
async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            path TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            last_modified INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_content ON documents(content)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store() -> (tempfile::TempDir, DocumentStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = DocumentStore::open(&tmp.path().join("docdex.sqlite"))
            .await
            .unwrap();
        (tmp, store)
    }

    #[test]
    fn literal_predicate_sql() {
        let (clause, params) = Predicate::Literal("foo".into()).to_sql();
        assert_eq!(clause, "content LIKE ?");
        assert_eq!(params, vec!["%foo%"]);
    }

    #[test]
    fn all_predicate_sql() {
        let pred = Predicate::All(vec![
            Predicate::Literal("alpha".into()),
            Predicate::Literal("beta".into()),
        ]);
        let (clause, params) = pred.to_sql();
        assert_eq!(clause, "(content LIKE ? AND content LIKE ?)");
        assert_eq!(params, vec!["%alpha%", "%beta%"]);
    }

    #[test]
    fn any_predicate_sql() {
        let pred = Predicate::Any(vec![
            Predicate::Literal("alpha".into()),
            Predicate::Literal("beta".into()),
        ]);
        let (clause, params) = pred.to_sql();
        assert_eq!(clause, "(content LIKE ? OR content LIKE ?)");
        assert_eq!(params, vec!["%alpha%", "%beta%"]);
    }

    #[tokio::test]
    async fn upsert_inserts_then_skips_then_updates() {
        let (_tmp, store) = open_store().await;

        let outcome = store.upsert_if_stale("/d/a.pdf", "first", 100).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        // Same modification time: no-op.
        let outcome = store.upsert_if_stale("/d/a.pdf", "ignored", 100).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);
        assert_eq!(store.get("/d/a.pdf").await.unwrap().unwrap().content, "first");

        // Older modification time: still a no-op.
        let outcome = store.upsert_if_stale("/d/a.pdf", "ignored", 50).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);

        // Strictly newer: content replaced.
        let outcome = store.upsert_if_stale("/d/a.pdf", "second", 200).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let doc = store.get("/d/a.pdf").await.unwrap().unwrap();
        assert_eq!(doc.content, "second");
        assert_eq!(doc.last_modified, 200);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let (_tmp, store) = open_store().await;
        store.upsert_if_stale("/d/a.pdf", "first", 100).await.unwrap();
        let before = store.get("/d/a.pdf").await.unwrap().unwrap();

        store.upsert_if_stale("/d/a.pdf", "second", 200).await.unwrap();
        let after = store.get("/d/a.pdf").await.unwrap().unwrap();
        assert_eq!(before.created_at, after.created_at);
    }

    #[tokio::test]
    async fn query_contains_all_and_any() {
        let (_tmp, store) = open_store().await;
        store.upsert_if_stale("/d/1.pdf", "alpha beta gamma", 1).await.unwrap();
        store.upsert_if_stale("/d/2.pdf", "alpha only here", 1).await.unwrap();
        store.upsert_if_stale("/d/3.pdf", "beta only here", 1).await.unwrap();

        let both = Predicate::All(vec![
            Predicate::Literal("alpha".into()),
            Predicate::Literal("beta".into()),
        ]);
        let rows = store.query_contains(&both, 1000).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, "/d/1.pdf");

        let either = Predicate::Any(vec![
            Predicate::Literal("alpha".into()),
            Predicate::Literal("beta".into()),
        ]);
        let rows = store.query_contains(&either, 1000).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn query_contains_respects_limit() {
        let (_tmp, store) = open_store().await;
        for i in 0..5 {
            store
                .upsert_if_stale(&format!("/d/{i}.pdf"), "needle here", 1)
                .await
                .unwrap();
        }
        let rows = store
            .query_contains(&Predicate::Literal("needle".into()), 3)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}
