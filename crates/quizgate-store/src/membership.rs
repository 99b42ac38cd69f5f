//! `MembershipStore` over the `channel_members` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quizgate_core::error::DomainError;
use quizgate_core::ids::UserId;
use quizgate_core::model::MemberStatus;
use quizgate_core::repository::{MembershipChecker, MembershipStore};

use crate::error::StoreError;
use crate::pg_store::PgStore;

impl PgStore {
    async fn fetch_member_status(
        &self,
        user_id: UserId,
    ) -> Result<Option<MemberStatus>, StoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM channel_members WHERE user_id = $1")
                .bind(user_id.get())
                .fetch_optional(&self.pool)
                .await?;
        status
            .map(|s| {
                s.parse()
                    .map_err(|_| StoreError::Corrupt(format!("unknown membership status {s:?}")))
            })
            .transpose()
    }

    async fn upsert_member_status(
        &self,
        user_id: UserId,
        status: MemberStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO channel_members (user_id, status, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
             status = EXCLUDED.status, updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id.get())
        .bind(status.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MembershipChecker for PgStore {
    async fn is_member(&self, user_id: UserId) -> Result<bool, DomainError> {
        let status = self
            .bounded("fetch_member_status", self.fetch_member_status(user_id))
            .await?;
        Ok(status.is_some_and(MemberStatus::grants_access))
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn record_membership(
        &self,
        user_id: UserId,
        status: MemberStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.bounded(
            "record_membership",
            self.upsert_member_status(user_id, status, at),
        )
        .await
    }
}
