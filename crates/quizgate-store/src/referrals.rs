//! `ReferralStore` over the `referrals` and `user_departments` tables.

use async_trait::async_trait;
use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::Referral;
use quizgate_core::repository::ReferralStore;

use crate::error::{StoreError, column_u32};
use crate::pg_store::PgStore;

impl PgStore {
    async fn append_referral(&self, referral: &Referral) -> Result<Option<u32>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Selecting from `users` makes an unknown inviter insert nothing.
        let count: Option<i32> = sqlx::query_scalar(
            "INSERT INTO user_departments (user_id, department_id, referral_count) \
             SELECT id, $2, 1 FROM users WHERE id = $1 \
             ON CONFLICT (user_id, department_id) DO UPDATE \
             SET referral_count = user_departments.referral_count + 1 \
             RETURNING referral_count",
        )
        .bind(referral.inviter_id.get())
        .bind(referral.department_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(count) = count else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO referrals (id, inviter_id, invited_id, department_id, recorded_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(referral.id)
        .bind(referral.inviter_id.get())
        .bind(referral.invited_id.get())
        .bind(referral.department_id.as_str())
        .bind(referral.recorded_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        column_u32(count, "referral_count").map(Some)
    }

    async fn flip_unlocked(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO user_departments (user_id, department_id, unlocked) \
             SELECT id, $2, TRUE FROM users WHERE id = $1 \
             ON CONFLICT (user_id, department_id) DO UPDATE SET unlocked = TRUE \
             WHERE user_departments.unlocked = FALSE",
        )
        .bind(user_id.get())
        .bind(department_id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(false)
        } else {
            Err(DomainError::NotFound(format!("user {user_id}")).into())
        }
    }
}

#[async_trait]
impl ReferralStore for PgStore {
    async fn record_referral(&self, referral: &Referral) -> Result<Option<u32>, DomainError> {
        self.bounded("record_referral", self.append_referral(referral))
            .await
    }

    async fn mark_unlocked(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
    ) -> Result<bool, DomainError> {
        self.bounded("mark_unlocked", self.flip_unlocked(user_id, department_id))
            .await
    }
}
