//! PostgreSQL implementation of the time-series store.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{MachineRegistryEntry, SessionRow};
use crate::config::AnalyticsConfig;
use crate::domain::RecordKey;
use crate::domain::metrics::{Metric, PerformanceRecord};
use crate::error::AnalyticsError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// Uniqueness of the raw `(machine_label, session_label)` pair is
/// enforced by the pre-insert check in the ingest path, not by a
/// storage constraint; two concurrent identical uploads can therefore
/// both pass the in-memory check. Single-writer request handling is
/// assumed.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] when the database is
    /// unreachable.
    pub async fn connect(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the inner pool (for startup migrations).
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Loads every stored raw `(machine_label, session_label)` pair.
    ///
    /// Bounded by realistic floor-report volume (thousands of rows per
    /// month); the ingest path diffs candidate batches against this set
    /// in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn existing_keys(&self) -> Result<HashSet<RecordKey>, AnalyticsError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT machine_label, session_label FROM performance_records",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(machine_label, session_label)| RecordKey {
                machine_label,
                session_label,
            })
            .collect())
    }

    /// Persists a staged batch inside a single transaction.
    ///
    /// The batch either fully commits or fully rolls back; on failure
    /// nothing is persisted and the caller reports zero inserted.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Ingestion`] on any failure; the
    /// transaction is rolled back.
    pub async fn insert_records(
        &self,
        records: &[PerformanceRecord],
    ) -> Result<u64, AnalyticsError> {
        let sql = insert_statement();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AnalyticsError::Ingestion(e.to_string()))?;

        for record in records {
            let mut query = sqlx::query(&sql)
                .bind(&record.machine_label)
                .bind(&record.session_label)
                .bind(record.session_date);
            for metric in Metric::ALL {
                query = query.bind(record.metric(metric));
            }
            // An error here drops the transaction, which rolls it back.
            query
                .execute(&mut *tx)
                .await
                .map_err(|e| AnalyticsError::Ingestion(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AnalyticsError::Ingestion(e.to_string()))?;

        Ok(records.len() as u64)
    }

    /// Distinct calendar years present in the store, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn distinct_years(&self) -> Result<Vec<i32>, AnalyticsError> {
        let years = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(YEAR FROM session_date)::INT AS y \
             FROM performance_records WHERE session_date IS NOT NULL ORDER BY y",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(years)
    }

    /// Distinct months (1–12) with data in the given year, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn distinct_months(&self, year: i32) -> Result<Vec<u32>, AnalyticsError> {
        let months = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(MONTH FROM session_date)::INT AS m \
             FROM performance_records \
             WHERE session_date IS NOT NULL AND EXTRACT(YEAR FROM session_date)::INT = $1 \
             ORDER BY m",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(months.into_iter().filter_map(|m| u32::try_from(m).ok()).collect())
    }

    /// Distinct days of month with data in the given year and month,
    /// ascending.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn distinct_days(&self, year: i32, month: u32) -> Result<Vec<u32>, AnalyticsError> {
        let (start, end) = month_bounds(year, month)?;
        let days = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(DAY FROM session_date)::INT AS d \
             FROM performance_records \
             WHERE session_date >= $1 AND session_date < $2 ORDER BY d",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(days.into_iter().filter_map(|d| u32::try_from(d).ok()).collect())
    }

    /// Loads every session row of the given year and month.
    ///
    /// One bounded read serves both aggregation tiers and the model
    /// sidebar; day and model restriction happen in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn month_rows(&self, year: i32, month: u32) -> Result<Vec<SessionRow>, AnalyticsError> {
        let (start, end) = month_bounds(year, month)?;
        let rows = sqlx::query_as::<_, (String, NaiveDate, f64, f64)>(
            "SELECT machine_label, session_date, \
                    COALESCE(total_in, 0), COALESCE(total_out, 0) \
             FROM performance_records \
             WHERE session_date >= $1 AND session_date < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(machine_label, session_date, total_in, total_out)| SessionRow {
                machine_label,
                session_date,
                total_in,
                total_out,
            })
            .collect())
    }

    /// Loads the machine registry with model and vendor metadata.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn machine_registry(&self) -> Result<Vec<MachineRegistryEntry>, AnalyticsError> {
        let rows = sqlx::query_as::<
            _,
            (String, Option<i32>, Option<String>, Option<String>, Option<String>),
        >(
            "SELECT m.machine_number, mo.id, mo.model_name, p.provider_name, m.status \
             FROM machines m \
             LEFT JOIN models mo ON mo.id = m.model_id \
             LEFT JOIN providers p ON p.id = mo.provider_id \
             ORDER BY m.machine_number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(machine_number, model_id, model_name, provider_name, status)| {
                    MachineRegistryEntry {
                        machine_number,
                        model_id,
                        model_name,
                        provider_name,
                        status,
                    }
                },
            )
            .collect())
    }

    /// Resolves the exchange rate for a `(year, month name)` pair.
    ///
    /// `None` is a data-completeness gap, not an error; callers degrade
    /// currency-converted KPI figures to zero.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Persistence`] on database failure.
    pub async fn exchange_rate(
        &self,
        year: i32,
        month_name: &str,
    ) -> Result<Option<f64>, AnalyticsError> {
        let rate = sqlx::query_scalar::<_, f64>(
            "SELECT rate FROM exchange_rates WHERE year = $1 AND month_name = $2 LIMIT 1",
        )
        .bind(year)
        .bind(month_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }
}

/// Builds the parameterized insert statement from the canonical metric
/// mapping. Identifiers never come from request data.
fn insert_statement() -> String {
    let metric_columns: Vec<&str> = Metric::ALL.iter().map(|m| m.column_name()).collect();
    let placeholders: Vec<String> = (0..Metric::ALL.len())
        .map(|i| format!("${}", i + 4))
        .collect();
    format!(
        "INSERT INTO performance_records (machine_label, session_label, session_date, {}) \
         VALUES ($1, $2, $3, {})",
        metric_columns.join(", "),
        placeholders.join(", ")
    )
}

/// Half-open date bounds `[first of month, first of next month)`.
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AnalyticsError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AnalyticsError::InvalidRequest(format!("invalid period {year}-{month}")))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AnalyticsError::InvalidRequest(format!("invalid period {year}-{month}")))?;
    Ok((start, end))
}
