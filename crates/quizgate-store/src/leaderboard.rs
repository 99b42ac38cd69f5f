//! `LeaderboardStore` over the `leaderboard` table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{DepartmentTally, LeaderboardEntry};
use quizgate_core::repository::LeaderboardStore;

use crate::error::StoreError;
use crate::pg_store::PgStore;
use crate::rows::{LeaderboardRow, department_id, user_id};

impl PgStore {
    async fn upsert_attempt(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO leaderboard (user_id, department_id, attempts, correct, updated_at) \
             VALUES ($1, $2, 1, CASE WHEN $3 THEN 1 ELSE 0 END, $4) \
             ON CONFLICT (user_id, department_id) DO UPDATE SET \
             attempts = leaderboard.attempts + 1, \
             correct = leaderboard.correct + EXCLUDED.correct, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id.get())
        .bind(department_id.as_str())
        .bind(correct)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "SELECT user_id, department_id, attempts, correct, updated_at \
             FROM leaderboard ORDER BY user_id, department_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries: BTreeMap<UserId, LeaderboardEntry> = BTreeMap::new();
        for row in rows {
            let (attempts, correct) = row.counts()?;
            let id = user_id(row.user_id)?;
            let entry = entries.entry(id).or_insert_with(|| LeaderboardEntry {
                user_id: id,
                departments: BTreeMap::new(),
                updated_at: row.updated_at,
            });
            entry.updated_at = entry.updated_at.max(row.updated_at);
            entry.departments.insert(
                department_id(&row.department_id)?,
                DepartmentTally { attempts, correct },
            );
        }
        Ok(entries.into_values().collect())
    }
}

#[async_trait]
impl LeaderboardStore for PgStore {
    async fn record_attempt(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.bounded(
            "record_attempt",
            self.upsert_attempt(user_id, department_id, correct, at),
        )
        .await
    }

    async fn scan_all(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        self.bounded("scan_leaderboard", self.fetch_leaderboard())
            .await
    }
}
