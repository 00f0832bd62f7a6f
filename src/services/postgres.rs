use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;
use std::time::Duration;

use super::{warn_short_signups, HistoryStore, ParticipantDirectory, SignupSource, StoreError};
use crate::config::{DatabaseSettings, RegistrationSettings};
use crate::models::{
    CycleId, CycleRecord, ExclusionHistory, MatchingResult, ParticipantId, Signup, TimeslotId,
    UnorderedPair,
};

/// PostgreSQL-backed signup source, participant directory and history store
///
/// Signups are written by the registration flow elsewhere; this client only
/// reads them. The exclusion history and the per-cycle processed marker are
/// owned here and are only ever appended to.
pub struct PostgresStore {
    pool: PgPool,
    registration: RegistrationSettings,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        registration: RegistrationSettings,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, registration })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        database: &DatabaseSettings,
        registration: RegistrationSettings,
    ) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max {} connections)",
            database.max_connections.unwrap_or(10)
        );

        Self::new(
            &database.url,
            database.max_connections.unwrap_or(10),
            database.min_connections.unwrap_or(1),
            Duration::from_secs(database.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(database.idle_timeout_secs.unwrap_or(600)),
            registration,
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn week_param(cycle: CycleId) -> Result<i32, StoreError> {
    i32::try_from(cycle.week).map_err(|_| StoreError::Corrupt(format!("week {}", cycle.week)))
}

#[async_trait]
impl SignupSource for PostgresStore {
    async fn registration_open(&self, _cycle: CycleId) -> bool {
        self.registration.open
    }

    async fn get_signups(&self, cycle: CycleId) -> Result<Vec<Signup>, StoreError> {
        let query = r#"
            SELECT participant_id, timeslots, first_problem, second_problem,
                   programming_language, english
            FROM mock_signups
            WHERE iso_year = $1 AND iso_week = $2
            ORDER BY created_at, id
        "#;

        let rows = sqlx::query(query)
            .bind(cycle.year)
            .bind(week_param(cycle)?)
            .fetch_all(&self.pool)
            .await?;

        let signups = rows
            .iter()
            .map(|row| -> Result<Signup, sqlx::Error> {
                let Json(timeslots): Json<Vec<u16>> = row.try_get("timeslots")?;
                Ok(Signup {
                    participant_id: ParticipantId(row.try_get("participant_id")?),
                    cycle,
                    timeslots: timeslots.into_iter().map(TimeslotId).collect::<BTreeSet<_>>(),
                    first_problem: row.try_get("first_problem")?,
                    second_problem: row.try_get("second_problem")?,
                    programming_language: row.try_get("programming_language")?,
                    english: row.try_get("english")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        warn_short_signups(cycle, &signups, self.registration.min_timeslots);

        tracing::debug!("Loaded {} signups for cycle {}", signups.len(), cycle);

        Ok(signups)
    }
}

#[async_trait]
impl ParticipantDirectory for PostgresStore {
    async fn resolve(&self, id: &ParticipantId) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT display_name FROM participants WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("display_name")?),
            None => Err(StoreError::NotFound(format!("participant {}", id))),
        }
    }
}

#[async_trait]
impl HistoryStore for PostgresStore {
    async fn snapshot(&self) -> Result<ExclusionHistory, StoreError> {
        let rows = sqlx::query("SELECT participant_low, participant_high FROM pair_history")
            .fetch_all(&self.pool)
            .await?;

        let history = rows
            .iter()
            .map(|row| -> Result<UnorderedPair, sqlx::Error> {
                Ok(UnorderedPair::new(
                    ParticipantId(row.try_get("participant_low")?),
                    ParticipantId(row.try_get("participant_high")?),
                ))
            })
            .collect::<Result<ExclusionHistory, sqlx::Error>>()?;

        tracing::debug!("Exclusion history snapshot has {} pairs", history.len());

        Ok(history)
    }

    async fn committed_cycle(&self, cycle: CycleId) -> Result<Option<CycleRecord>, StoreError> {
        let query = r#"
            SELECT run_id, result, committed_at
            FROM pairing_cycles
            WHERE iso_year = $1 AND iso_week = $2
        "#;

        let row = sqlx::query(query)
            .bind(cycle.year)
            .bind(week_param(cycle)?)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let Json(result): Json<MatchingResult> = row
            .try_get("result")
            .map_err(|e| StoreError::Corrupt(format!("cycle {} result: {}", cycle, e)))?;

        Ok(Some(CycleRecord {
            cycle,
            run_id: row.try_get("run_id")?,
            result,
            committed_at: row.try_get("committed_at")?,
        }))
    }

    /// Marker and pairs go in one transaction; the marker insert doubles as
    /// the at-most-once guard.
    async fn commit(&self, record: &CycleRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let marker = sqlx::query(
            r#"
            INSERT INTO pairing_cycles
                (iso_year, iso_week, run_id, result, pair_count, unmatched_count, committed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (iso_year, iso_week) DO NOTHING
            "#,
        )
        .bind(record.cycle.year)
        .bind(week_param(record.cycle)?)
        .bind(record.run_id)
        .bind(Json(&record.result))
        .bind(record.result.pairs.len() as i32)
        .bind(record.result.unmatched.len() as i32)
        .bind(record.committed_at)
        .execute(&mut *tx)
        .await?;

        if marker.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::AlreadyCommitted(record.cycle));
        }

        for pair in &record.result.pairs {
            let key = pair.key();
            sqlx::query(
                r#"
                INSERT INTO pair_history (participant_low, participant_high, iso_year, iso_week)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (participant_low, participant_high) DO NOTHING
                "#,
            )
            .bind(key.low().as_str())
            .bind(key.high().as_str())
            .bind(record.cycle.year)
            .bind(week_param(record.cycle)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Committed cycle {} with {} pairs",
            record.cycle,
            record.result.pairs.len()
        );

        Ok(())
    }
}
