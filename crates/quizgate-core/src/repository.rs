//! Store abstractions consumed by the engine.
//!
//! Every counter mutation is expressed as an atomic operation on the store
//! so that implementations can apply it without a read-modify-write cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::ids::{DepartmentId, UserId};
use crate::model::{
    Ad, AnswerDelta, Department, LeaderboardEntry, MemberStatus, Question, Referral, Session, User,
    UserProfile,
};

/// Read access to departments, questions and ads, plus the ingestion writes.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Loads a department by id.
    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, DomainError>;

    /// Loads the question with exactly `question_number` in `department_id`.
    async fn get_question(
        &self,
        department_id: &DepartmentId,
        question_number: u32,
    ) -> Result<Option<Question>, DomainError>;

    /// Lists departments flagged active.
    async fn list_active_departments(&self) -> Result<Vec<Department>, DomainError>;

    /// Lists active ads ordered by `order_index` ascending.
    async fn list_active_ads(&self) -> Result<Vec<Ad>, DomainError>;

    /// Replaces a department's record and its whole question set.
    async fn put_department(
        &self,
        department: &Department,
        questions: &[Question],
    ) -> Result<(), DomainError>;

    /// Adds an ad to the rotation pool.
    async fn add_ad(&self, ad: &Ad) -> Result<(), DomainError>;
}

/// User documents, including the embedded session.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Loads a user.
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Creates a user if none exists. Returns `false` if the id was taken.
    async fn create(&self, user: &User) -> Result<bool, DomainError>;

    /// Overwrites the display fields of an existing user.
    async fn update_profile(&self, id: UserId, profile: &UserProfile) -> Result<(), DomainError>;

    /// Writes the session as a whole unit, replacing any previous one.
    async fn save_session(&self, id: UserId, session: &Session) -> Result<(), DomainError>;

    /// Atomically applies one accepted answer to the session counters and
    /// the user's global totals, and returns the updated session.
    ///
    /// The increment only applies while the stored session is active and
    /// its cursor still equals `delta.expected_index`.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when no active session exists, `StaleAnswer` when
    /// the cursor already moved.
    async fn apply_answer(&self, id: UserId, delta: AnswerDelta) -> Result<Session, DomainError>;

    /// Counts registered users.
    async fn count(&self) -> Result<u64, DomainError>;
}

/// The referral audit trail and per-department unlock state.
#[async_trait]
pub trait ReferralStore: Send + Sync {
    /// Appends `referral` and increments the inviter's count for its
    /// department as one unit. Returns the new count, or `None` (and writes
    /// nothing) when the inviter is not a known user.
    async fn record_referral(&self, referral: &Referral) -> Result<Option<u32>, DomainError>;

    /// Sets the unlock flag for `(user, department)` if it is not already
    /// set. Returns `true` only for the call that flipped it.
    async fn mark_unlocked(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
    ) -> Result<bool, DomainError>;
}

/// Per-user, per-department attempt tallies.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Increments `attempts` (and `correct` when `correct`) for the pair,
    /// creating the tally if absent.
    async fn record_attempt(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Returns every leaderboard entry.
    async fn scan_all(&self) -> Result<Vec<LeaderboardEntry>, DomainError>;
}

/// Decides whether a user has joined the channel that gates quiz access.
///
/// Callers treat an error as "not a member".
#[async_trait]
pub trait MembershipChecker: Send + Sync {
    /// Returns whether `user_id` currently belongs to the channel.
    async fn is_member(&self, user_id: UserId) -> Result<bool, DomainError>;
}

/// Channel membership as last reported by the chat platform.
#[async_trait]
pub trait MembershipStore: MembershipChecker {
    /// Records the latest reported status of `user_id`, replacing any
    /// earlier one.
    async fn record_membership(
        &self,
        user_id: UserId,
        status: MemberStatus,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}

/// Admits everyone. Used when no channel membership is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenMembership;

#[async_trait]
impl MembershipChecker for OpenMembership {
    async fn is_member(&self, _user_id: UserId) -> Result<bool, DomainError> {
        Ok(true)
    }
}
