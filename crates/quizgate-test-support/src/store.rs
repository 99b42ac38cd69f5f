//! Test stores — in-memory and always-failing implementations of every
//! store trait.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{
    Ad, AnswerDelta, Department, LeaderboardEntry, MemberStatus, Question, Referral, Session, User,
    UserProfile,
};
use quizgate_core::repository::{
    ContentStore, LeaderboardStore, MembershipChecker, MembershipStore, ReferralStore, UserStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    departments: BTreeMap<DepartmentId, Department>,
    questions: BTreeMap<(DepartmentId, u32), Question>,
    ads: Vec<Ad>,
    referrals: Vec<Referral>,
    leaderboard: HashMap<UserId, LeaderboardEntry>,
    members: HashMap<UserId, MemberStatus>,
}

/// A store that keeps every document in memory behind one mutex.
///
/// Each trait method runs inside a single critical section, which gives the
/// same all-or-nothing behavior the PostgreSQL store gets from transactions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    /// Returns a snapshot of the referral audit trail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn referrals(&self) -> Vec<Referral> {
        self.lock().referrals.clone()
    }

    /// Returns a snapshot of a user document.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn user(&self, id: UserId) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn get_department(&self, id: &DepartmentId) -> Result<Option<Department>, DomainError> {
        Ok(self.lock().departments.get(id).cloned())
    }

    async fn get_question(
        &self,
        department_id: &DepartmentId,
        question_number: u32,
    ) -> Result<Option<Question>, DomainError> {
        Ok(self
            .lock()
            .questions
            .get(&(department_id.clone(), question_number))
            .cloned())
    }

    async fn list_active_departments(&self) -> Result<Vec<Department>, DomainError> {
        Ok(self
            .lock()
            .departments
            .values()
            .filter(|d| d.is_active)
            .cloned()
            .collect())
    }

    async fn list_active_ads(&self) -> Result<Vec<Ad>, DomainError> {
        let mut ads: Vec<Ad> = self
            .lock()
            .ads
            .iter()
            .filter(|ad| ad.is_active)
            .cloned()
            .collect();
        ads.sort_by_key(|ad| ad.order_index);
        Ok(ads)
    }

    async fn put_department(
        &self,
        department: &Department,
        questions: &[Question],
    ) -> Result<(), DomainError> {
        let mut state = self.lock();
        state
            .questions
            .retain(|(dept, _), _| dept != &department.id);
        for question in questions {
            state.questions.insert(
                (department.id.clone(), question.question_number),
                question.clone(),
            );
        }
        state
            .departments
            .insert(department.id.clone(), department.clone());
        Ok(())
    }

    async fn add_ad(&self, ad: &Ad) -> Result<(), DomainError> {
        self.lock().ads.push(ad.clone());
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn create(&self, user: &User) -> Result<bool, DomainError> {
        let mut state = self.lock();
        if state.users.contains_key(&user.id) {
            return Ok(false);
        }
        state.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn update_profile(&self, id: UserId, profile: &UserProfile) -> Result<(), DomainError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))?;
        user.profile = profile.clone();
        Ok(())
    }

    async fn save_session(&self, id: UserId, session: &Session) -> Result<(), DomainError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))?;
        user.session = Some(session.clone());
        Ok(())
    }

    async fn apply_answer(&self, id: UserId, delta: AnswerDelta) -> Result<Session, DomainError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))?;
        let session = user
            .session
            .as_mut()
            .filter(|s| s.session_active)
            .ok_or(DomainError::SessionExpired(id))?;
        if session.current_question_index != delta.expected_index {
            return Err(DomainError::StaleAnswer {
                expected: session.due_question_number(),
                claimed: delta.expected_index + 1,
            });
        }
        session.record_answer(delta.correct);
        let updated = session.clone();
        user.total_attempts += 1;
        if delta.correct {
            user.total_correct += 1;
        }
        Ok(updated)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.lock().users.len() as u64)
    }
}

#[async_trait]
impl ReferralStore for InMemoryStore {
    async fn record_referral(&self, referral: &Referral) -> Result<Option<u32>, DomainError> {
        let mut state = self.lock();
        let Some(inviter) = state.users.get_mut(&referral.inviter_id) else {
            return Ok(None);
        };
        let count = inviter
            .referral_counts
            .entry(referral.department_id.clone())
            .or_insert(0);
        *count += 1;
        let count = *count;
        state.referrals.push(referral.clone());
        Ok(Some(count))
    }

    async fn mark_unlocked(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
    ) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::NotFound(format!("user {user_id}")))?;
        let flag = user
            .unlocked_departments
            .entry(department_id.clone())
            .or_insert(false);
        if *flag {
            return Ok(false);
        }
        *flag = true;
        Ok(true)
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryStore {
    async fn record_attempt(
        &self,
        user_id: UserId,
        department_id: &DepartmentId,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut state = self.lock();
        let entry = state
            .leaderboard
            .entry(user_id)
            .or_insert_with(|| LeaderboardEntry {
                user_id,
                departments: BTreeMap::new(),
                updated_at: at,
            });
        let tally = entry.departments.entry(department_id.clone()).or_default();
        tally.attempts += 1;
        if correct {
            tally.correct += 1;
        }
        entry.updated_at = at;
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let mut entries: Vec<LeaderboardEntry> =
            self.lock().leaderboard.values().cloned().collect();
        entries.sort_by_key(|e| e.user_id);
        Ok(entries)
    }
}

#[async_trait]
impl MembershipChecker for InMemoryStore {
    async fn is_member(&self, user_id: UserId) -> Result<bool, DomainError> {
        Ok(self
            .lock()
            .members
            .get(&user_id)
            .is_some_and(|status| status.grants_access()))
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn record_membership(
        &self,
        user_id: UserId,
        status: MemberStatus,
        _at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.lock().members.insert(user_id, status);
        Ok(())
    }
}

/// A store whose every call fails with `StorageUnavailable`. Useful for
/// testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable<T>() -> Result<T, DomainError> {
    Err(DomainError::StorageUnavailable("connection refused".into()))
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn get_department(&self, _id: &DepartmentId) -> Result<Option<Department>, DomainError> {
        unavailable()
    }

    async fn get_question(
        &self,
        _department_id: &DepartmentId,
        _question_number: u32,
    ) -> Result<Option<Question>, DomainError> {
        unavailable()
    }

    async fn list_active_departments(&self) -> Result<Vec<Department>, DomainError> {
        unavailable()
    }

    async fn list_active_ads(&self) -> Result<Vec<Ad>, DomainError> {
        unavailable()
    }

    async fn put_department(
        &self,
        _department: &Department,
        _questions: &[Question],
    ) -> Result<(), DomainError> {
        unavailable()
    }

    async fn add_ad(&self, _ad: &Ad) -> Result<(), DomainError> {
        unavailable()
    }
}

#[async_trait]
impl UserStore for FailingStore {
    async fn get(&self, _id: UserId) -> Result<Option<User>, DomainError> {
        unavailable()
    }

    async fn create(&self, _user: &User) -> Result<bool, DomainError> {
        unavailable()
    }

    async fn update_profile(&self, _id: UserId, _profile: &UserProfile) -> Result<(), DomainError> {
        unavailable()
    }

    async fn save_session(&self, _id: UserId, _session: &Session) -> Result<(), DomainError> {
        unavailable()
    }

    async fn apply_answer(&self, _id: UserId, _delta: AnswerDelta) -> Result<Session, DomainError> {
        unavailable()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        unavailable()
    }
}

#[async_trait]
impl ReferralStore for FailingStore {
    async fn record_referral(&self, _referral: &Referral) -> Result<Option<u32>, DomainError> {
        unavailable()
    }

    async fn mark_unlocked(
        &self,
        _user_id: UserId,
        _department_id: &DepartmentId,
    ) -> Result<bool, DomainError> {
        unavailable()
    }
}

#[async_trait]
impl LeaderboardStore for FailingStore {
    async fn record_attempt(
        &self,
        _user_id: UserId,
        _department_id: &DepartmentId,
        _correct: bool,
        _at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        unavailable()
    }

    async fn scan_all(&self) -> Result<Vec<LeaderboardEntry>, DomainError> {
        unavailable()
    }
}

#[async_trait]
impl MembershipChecker for FailingStore {
    async fn is_member(&self, _user_id: UserId) -> Result<bool, DomainError> {
        unavailable()
    }
}

#[async_trait]
impl MembershipStore for FailingStore {
    async fn record_membership(
        &self,
        _user_id: UserId,
        _status: MemberStatus,
        _at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        unavailable()
    }
}
