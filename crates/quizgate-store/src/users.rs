//! `UserStore` over the `users`, `user_departments` and `sessions` tables.

use async_trait::async_trait;
use quizgate_core::error::DomainError;
use quizgate_core::ids::UserId;
use quizgate_core::model::{AnswerDelta, Session, User, UserProfile};
use quizgate_core::repository::UserStore;

use crate::error::{StoreError, column_u32, column_u64, param_i32};
use crate::pg_store::PgStore;
use crate::rows::{SessionRow, UserDepartmentRow, UserRow, department_id, user_id};

const SESSION_COLUMNS: &str = "department_id, current_question_index, correct_in_session, \
     attempted_in_session, ad_break_counter, session_active";

impl PgStore {
    /// Reads the user row, department flags and session from one snapshot,
    /// so a concurrent answer is seen in all three or in none.
    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(row): Option<UserRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, username, total_attempts, total_correct, \
             created_at FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let departments: Vec<UserDepartmentRow> = sqlx::query_as(
            "SELECT department_id, referral_count, unlocked \
             FROM user_departments WHERE user_id = $1",
        )
        .bind(id.get())
        .fetch_all(&mut *tx)
        .await?;

        let session: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        let mut user = User::new(
            user_id(row.id)?,
            UserProfile {
                first_name: row.first_name,
                last_name: row.last_name,
                username: row.username,
            },
            row.created_at,
        );
        user.total_attempts = column_u64(row.total_attempts, "total_attempts")?;
        user.total_correct = column_u64(row.total_correct, "total_correct")?;
        for department in departments {
            let key = department_id(&department.department_id)?;
            if department.referral_count > 0 {
                user.referral_counts.insert(
                    key.clone(),
                    column_u32(department.referral_count, "referral_count")?,
                );
            }
            if department.unlocked {
                user.unlocked_departments.insert(key, true);
            }
        }
        user.session = session.map(Session::try_from).transpose()?;
        Ok(Some(user))
    }

    async fn insert_user(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (id, first_name, last_name, username, total_attempts, \
             total_correct, created_at) VALUES ($1, $2, $3, $4, 0, 0, $5) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(user.id.get())
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(&user.profile.username)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn write_profile(&self, id: UserId, profile: &UserProfile) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $2, last_name = $3, username = $4 WHERE id = $1",
        )
        .bind(id.get())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("user {id}")).into());
        }
        Ok(())
    }

    async fn write_session(&self, id: UserId, session: &Session) -> Result<(), StoreError> {
        let result = sqlx::query(&format!(
            "INSERT INTO sessions (user_id, {SESSION_COLUMNS}) \
             SELECT id, $2, $3, $4, $5, $6, $7 FROM users WHERE id = $1 \
             ON CONFLICT (user_id) DO UPDATE SET \
             department_id = EXCLUDED.department_id, \
             current_question_index = EXCLUDED.current_question_index, \
             correct_in_session = EXCLUDED.correct_in_session, \
             attempted_in_session = EXCLUDED.attempted_in_session, \
             ad_break_counter = EXCLUDED.ad_break_counter, \
             session_active = EXCLUDED.session_active"
        ))
        .bind(id.get())
        .bind(session.department_id.as_str())
        .bind(param_i32(session.current_question_index, "current_question_index")?)
        .bind(param_i32(session.correct_in_session, "correct_in_session")?)
        .bind(param_i32(session.attempted_in_session, "attempted_in_session")?)
        .bind(param_i32(session.ad_break_counter, "ad_break_counter")?)
        .bind(session.session_active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("user {id}")).into());
        }
        Ok(())
    }

    async fn increment_answer(&self, id: UserId, delta: AnswerDelta) -> Result<Session, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<SessionRow> = sqlx::query_as(&format!(
            "UPDATE sessions SET \
             current_question_index = current_question_index + 1, \
             attempted_in_session = attempted_in_session + 1, \
             correct_in_session = correct_in_session + CASE WHEN $3 THEN 1 ELSE 0 END \
             WHERE user_id = $1 AND session_active AND current_question_index = $2 \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id.get())
        .bind(param_i32(delta.expected_index, "current_question_index")?)
        .bind(delta.correct)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            let current: Option<SessionRow> = sqlx::query_as(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1"
            ))
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await?;
            return Err(match current.map(Session::try_from).transpose()? {
                Some(session) if session.session_active => DomainError::StaleAnswer {
                    expected: session.due_question_number(),
                    claimed: delta.expected_index + 1,
                },
                _ => DomainError::SessionExpired(id),
            }
            .into());
        };

        sqlx::query(
            "UPDATE users SET total_attempts = total_attempts + 1, \
             total_correct = total_correct + CASE WHEN $2 THEN 1 ELSE 0 END \
             WHERE id = $1",
        )
        .bind(id.get())
        .bind(delta.correct)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Session::try_from(updated)
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        column_u64(count, "count")
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        self.bounded("get_user", self.fetch_user(id)).await
    }

    async fn create(&self, user: &User) -> Result<bool, DomainError> {
        self.bounded("create_user", self.insert_user(user)).await
    }

    async fn update_profile(&self, id: UserId, profile: &UserProfile) -> Result<(), DomainError> {
        self.bounded("update_profile", self.write_profile(id, profile))
            .await
    }

    async fn save_session(&self, id: UserId, session: &Session) -> Result<(), DomainError> {
        self.bounded("save_session", self.write_session(id, session))
            .await
    }

    async fn apply_answer(&self, id: UserId, delta: AnswerDelta) -> Result<Session, DomainError> {
        self.bounded("apply_answer", self.increment_answer(id, delta))
            .await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        self.bounded("count_users", self.count_users()).await
    }
}
