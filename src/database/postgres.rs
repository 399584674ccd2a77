use crate::database::{paths, DocumentStore, Precondition, Snapshot, Subscription};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Documents live in one `documents` table keyed by path. Conditional writes
/// are single statements, so the version check and the write are atomic.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    poll_interval: Duration,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, poll_interval: Duration) -> Self {
        Self {
            pool,
            poll_interval,
        }
    }
}

fn snapshot_from_row(path: &str, row: &PgRow) -> Result<Snapshot> {
    let data: JsonValue = row.try_get("data")?;
    let version: i64 = row.try_get("version")?;
    Ok(Snapshot::new(path, version as u64, data))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, path: &str) -> Result<Option<Snapshot>> {
        let row = sqlx::query(r#"SELECT data, version FROM documents WHERE path = $1"#)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| snapshot_from_row(path, &r)).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query(
            r#"SELECT path, data, version FROM documents WHERE parent = $1 ORDER BY path ASC"#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let path: String = row.try_get("path")?;
                snapshot_from_row(&path, row)
            })
            .collect()
    }

    async fn put(&self, path: &str, data: JsonValue, precondition: Precondition) -> Result<u64> {
        let parent = paths::parent(path);
        let row = match precondition {
            Precondition::None => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (path, parent, data, version)
                    VALUES ($1, $2, $3, 1)
                    ON CONFLICT (path) DO UPDATE
                    SET data = EXCLUDED.data, version = documents.version + 1, updated_at = NOW()
                    RETURNING version
                    "#,
                )
                .bind(path)
                .bind(parent)
                .bind(&data)
                .fetch_optional(&self.pool)
                .await?
            }
            Precondition::Absent => {
                sqlx::query(
                    r#"
                    INSERT INTO documents (path, parent, data, version)
                    VALUES ($1, $2, $3, 1)
                    ON CONFLICT (path) DO NOTHING
                    RETURNING version
                    "#,
                )
                .bind(path)
                .bind(parent)
                .bind(&data)
                .fetch_optional(&self.pool)
                .await?
            }
            Precondition::Version(expected) => {
                sqlx::query(
                    r#"
                    UPDATE documents
                    SET data = $2, version = version + 1, updated_at = NOW()
                    WHERE path = $1 AND version = $3
                    RETURNING version
                    "#,
                )
                .bind(path)
                .bind(&data)
                .bind(expected as i64)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let Some(row) = row else {
            return Err(Error::Conflict(path.to_string()));
        };
        let version: i64 = row.try_get("version")?;
        Ok(version as u64)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        let pool = self.pool.clone();
        let interval = self.poll_interval;
        let path = path.to_string();

        let source = async_stream::stream! {
            let mut last_version = 0;
            loop {
                let fetched = sqlx::query(r#"SELECT data, version FROM documents WHERE path = $1"#)
                    .bind(&path)
                    .fetch_optional(&pool)
                    .await;
                match fetched {
                    Ok(Some(row)) => match snapshot_from_row(&path, &row) {
                        Ok(snapshot) if snapshot.version > last_version => {
                            last_version = snapshot.version;
                            yield snapshot;
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(path = %path, error = ?e, "undecodable document row"),
                    },
                    Ok(None) => {}
                    Err(e) => tracing::error!(path = %path, error = ?e, "subscription poll failed"),
                }
                tokio::time::sleep(interval).await;
            }
        };

        Ok(Subscription::spawn(source))
    }
}
