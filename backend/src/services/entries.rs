//! Entry book: inventory entries addressed by their natural key

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use shared::{normalize_label, Entry, EntryKey, EntryScope};

use super::record_store::millis_to_utc;
use crate::error::{AppError, AppResult};

/// Entry service for row-level inventory entries
#[derive(Clone)]
pub struct EntryService {
    db: SqlitePool,
}

/// An entry as held in the book
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntry {
    pub id: i64,
    pub entry: Entry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row for entry queries
#[derive(Debug, FromRow)]
struct EntryRow {
    id: i64,
    entry: Json<Entry>,
    created_at_ms: i64,
    updated_at_ms: i64,
}

impl TryFrom<EntryRow> for StoredEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let context = format!("entry {}", row.id);
        Ok(StoredEntry {
            id: row.id,
            entry: row.entry.0,
            created_at: millis_to_utc(row.created_at_ms, &context)?,
            updated_at: millis_to_utc(row.updated_at_ms, &context)?,
        })
    }
}

impl EntryService {
    /// Create a new EntryService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert an entry, or replace the one with the same natural key.
    ///
    /// A replaced entry keeps its id, its place in listings and its
    /// `created_at`.
    #[tracing::instrument(skip(self, entry), fields(date = %entry.date, item = %entry.line.item))]
    pub async fn save_entry(&self, entry: &Entry) -> AppResult<StoredEntry> {
        let key = entry.natural_key();
        let now = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO entries (
                entry_date, branch, department, group_name, item, entry,
                created_at_ms, updated_at_ms
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT(entry_date, branch, department, group_name, item) DO UPDATE SET
                entry = excluded.entry,
                updated_at_ms = MAX(entries.updated_at_ms, excluded.updated_at_ms)
            RETURNING id, entry, created_at_ms, updated_at_ms
            "#,
        )
        .bind(key.date)
        .bind(&key.branch)
        .bind(&key.department)
        .bind(&key.group)
        .bind(&key.item)
        .bind(Json(entry))
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        StoredEntry::try_from(row)
    }

    /// Entry stored under `key`, if any
    pub async fn load_entry(&self, key: &EntryKey) -> AppResult<Option<StoredEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry, created_at_ms, updated_at_ms
            FROM entries
            WHERE entry_date = ?1 AND branch = ?2 AND department = ?3
              AND group_name = ?4 AND item = ?5
            "#,
        )
        .bind(key.date)
        .bind(normalize_label(&key.branch))
        .bind(normalize_label(&key.department))
        .bind(normalize_label(&key.group))
        .bind(&key.item)
        .fetch_optional(&self.db)
        .await?;

        row.map(StoredEntry::try_from).transpose()
    }

    /// Delete the entry under `key`, returning how many rows went (0 or 1)
    #[tracing::instrument(skip(self))]
    pub async fn delete_entry(&self, key: &EntryKey) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM entries
            WHERE entry_date = ?1 AND branch = ?2 AND department = ?3
              AND group_name = ?4 AND item = ?5
            "#,
        )
        .bind(key.date)
        .bind(normalize_label(&key.branch))
        .bind(normalize_label(&key.department))
        .bind(normalize_label(&key.group))
        .bind(&key.item)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Entries in scope, in the order they were first saved
    #[tracing::instrument(skip(self))]
    pub async fn list_entries(&self, scope: &EntryScope) -> AppResult<Vec<Entry>> {
        let rows = sqlx::query_as::<_, (Json<Entry>,)>(
            r#"
            SELECT entry
            FROM entries
            WHERE entry_date BETWEEN ?1 AND ?2
              AND branch = ?3 AND department = ?4
              AND (?5 IS NULL OR group_name = ?5)
            ORDER BY id
            "#,
        )
        .bind(scope.dates.start)
        .bind(scope.dates.end)
        .bind(normalize_label(&scope.branch))
        .bind(normalize_label(&scope.department))
        .bind(scope.group.as_deref().map(normalize_label))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(entry,)| entry.0).collect())
    }

    /// Entries for a single day, used by per-day report fan-out
    pub async fn list_day(
        &self,
        date: NaiveDate,
        branch: &str,
        department: &str,
        group: Option<&str>,
    ) -> AppResult<Vec<Entry>> {
        let mut scope = EntryScope::on(date, branch, department);
        if let Some(group) = group {
            scope = scope.group(group);
        }
        self.list_entries(&scope).await
    }
}
