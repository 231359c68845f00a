use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{Category, CategoryCounts, DailyCounts, PredictionEvent},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Append-only log of classification events
///
/// All aggregate views are derived from this log. Dates are always UTC
/// calendar dates, on the write path as well as in the per-day query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Appends an event stamped with the current UTC instant
    async fn record(&self, category: &Category) -> AppResult<PredictionEvent>;

    /// Total occurrences per category across the whole history
    async fn count_by_category(&self) -> AppResult<CategoryCounts>;

    /// Per-day occurrences for UTC dates in `[start, end]`
    ///
    /// Only days with at least one event are present in the result.
    async fn count_by_category_per_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<DailyCounts>;
}

/// SQLite-backed prediction log
#[derive(Clone)]
pub struct SqlitePredictionStore {
    pool: SqlitePool,
}

impl SqlitePredictionStore {
    /// Wraps a pool, creating the `predictions` table if it does not exist
    pub async fn new(pool: SqlitePool) -> AppResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_predictions_timestamp ON predictions (timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Appends an event with an explicit timestamp
    ///
    /// Stored with millisecond precision; the returned event carries the
    /// truncated instant so it matches what a later read would see.
    pub async fn record_at(
        &self,
        category: &Category,
        timestamp: DateTime<Utc>,
    ) -> AppResult<PredictionEvent> {
        let timestamp = timestamp.trunc_subsecs(3);

        let id = sqlx::query("INSERT INTO predictions (category, timestamp) VALUES (?, ?)")
            .bind(category.as_str())
            .bind(format_timestamp(&timestamp))
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        tracing::debug!(id, category = %category, "Prediction recorded");

        Ok(PredictionEvent {
            id,
            category: category.clone(),
            timestamp,
        })
    }
}

#[async_trait]
impl PredictionStore for SqlitePredictionStore {
    async fn record(&self, category: &Category) -> AppResult<PredictionEvent> {
        self.record_at(category, Utc::now()).await
    }

    async fn count_by_category(&self) -> AppResult<CategoryCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT category, COUNT(*) FROM predictions GROUP BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    async fn count_by_category_per_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<DailyCounts> {
        if end < start {
            return Ok(DailyCounts::new());
        }

        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT DATE(timestamp) AS day, category, COUNT(*) AS cnt
            FROM predictions
            WHERE DATE(timestamp) BETWEEN ? AND ?
            GROUP BY day, category
            ORDER BY day ASC
            "#,
        )
        .bind(start.format(DATE_FORMAT).to_string())
        .bind(end.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut daily = DailyCounts::new();
        for (day, category, count) in rows {
            let date = NaiveDate::parse_from_str(&day, DATE_FORMAT).map_err(|e| {
                AppError::Internal(format!("Unparseable prediction date {}: {}", day, e))
            })?;
            daily.entry(date).or_default().insert(category, count);
        }

        Ok(daily)
    }
}

/// RFC 3339 with a `Z` suffix, which SQLite's date functions read as UTC
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
