//! Command handlers for the Referral & Unlock context.

use quizgate_core::clock::Clock;
use quizgate_core::error::DomainError;
use quizgate_core::model::Referral;
use quizgate_core::policy::UNLOCK_THRESHOLD;
use quizgate_core::repository::{ReferralStore, UserStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::commands::{CheckUnlock, RecordReferral};
use crate::domain::unlock::{self, ReferralOutcome, UnlockDecision, UnlockOutcome};

/// Handles the `RecordReferral` command: rejects self-referrals and
/// department-less links, then appends the audit record and increments the
/// inviter's department count as one store operation.
///
/// # Errors
///
/// Returns the store's error if the write fails; nothing is recorded then.
pub async fn handle_record_referral(
    command: &RecordReferral,
    clock: &dyn Clock,
    store: &dyn ReferralStore,
) -> Result<ReferralOutcome, DomainError> {
    if command.inviter_id == command.invited_id {
        debug!(user_id = %command.invited_id, "ignoring self-referral");
        return Ok(ReferralOutcome::SelfReferral);
    }
    let Some(department_id) = command.department_id.clone() else {
        debug!(inviter_id = %command.inviter_id, "ignoring referral without department");
        return Ok(ReferralOutcome::MissingDepartment);
    };

    let referral = Referral {
        id: Uuid::new_v4(),
        inviter_id: command.inviter_id,
        invited_id: command.invited_id,
        department_id,
        recorded_at: clock.now(),
    };

    match store.record_referral(&referral).await? {
        Some(referrals) => {
            info!(
                correlation_id = %command.correlation_id,
                inviter_id = %referral.inviter_id,
                invited_id = %referral.invited_id,
                department_id = %referral.department_id,
                referrals,
                "referral recorded"
            );
            Ok(ReferralOutcome::Recorded { referrals })
        }
        None => {
            debug!(inviter_id = %referral.inviter_id, "inviter unknown, referral not recorded");
            Ok(ReferralOutcome::UnknownInviter)
        }
    }
}

/// Handles the `CheckUnlock` command: sets the unlock flag once the user has
/// enough referrals for the department.
///
/// Returns `NewlyUnlocked` only for the call that flipped the flag, so
/// callers can use it to notify the user exactly once.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist, or the
/// store's error if a read or write fails.
pub async fn handle_check_unlock(
    command: &CheckUnlock,
    users: &dyn UserStore,
    referrals: &dyn ReferralStore,
) -> Result<UnlockOutcome, DomainError> {
    let user = users
        .get(command.user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {}", command.user_id)))?;

    let decision = unlock::decide(
        user.referral_count(&command.department_id),
        user.is_unlocked(&command.department_id),
    );
    match decision {
        UnlockDecision::AlreadyUnlocked => Ok(UnlockOutcome::AlreadyUnlocked),
        UnlockDecision::StillLocked { referrals } => Ok(UnlockOutcome::StillLocked {
            referrals,
            required: UNLOCK_THRESHOLD,
        }),
        UnlockDecision::Eligible => {
            if referrals
                .mark_unlocked(command.user_id, &command.department_id)
                .await?
            {
                info!(
                    correlation_id = %command.correlation_id,
                    user_id = %command.user_id,
                    department_id = %command.department_id,
                    "department unlocked"
                );
                Ok(UnlockOutcome::NewlyUnlocked)
            } else {
                Ok(UnlockOutcome::AlreadyUnlocked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quizgate_core::error::DomainError;
    use quizgate_core::ids::{DepartmentId, UserId};
    use quizgate_core::model::{User, UserProfile};
    use quizgate_core::repository::UserStore;
    use quizgate_test_support::{FailingStore, FixedClock, InMemoryStore, fixed_now, user_id};
    use uuid::Uuid;

    use super::{handle_check_unlock, handle_record_referral};
    use crate::domain::commands::{CheckUnlock, RecordReferral};
    use crate::domain::unlock::{ReferralOutcome, UnlockOutcome};

    fn dept(name: &str) -> DepartmentId {
        DepartmentId::new(name).unwrap()
    }

    async fn register(store: &InMemoryStore, id: UserId) {
        store
            .create(&User::new(id, UserProfile::default(), fixed_now()))
            .await
            .unwrap();
    }

    fn referral(inviter: i64, invited: i64, department: Option<&str>) -> RecordReferral {
        RecordReferral {
            correlation_id: Uuid::new_v4(),
            inviter_id: user_id(inviter),
            invited_id: user_id(invited),
            department_id: department.map(dept),
        }
    }

    fn check(user: i64, department: &str) -> CheckUnlock {
        CheckUnlock {
            correlation_id: Uuid::new_v4(),
            user_id: user_id(user),
            department_id: dept(department),
        }
    }

    #[tokio::test]
    async fn test_handle_record_referral_increments_department_count() {
        // Arrange
        let store = InMemoryStore::new();
        let clock = FixedClock(fixed_now());
        register(&store, user_id(1)).await;

        // Act
        let first = handle_record_referral(&referral(1, 2, Some("Math")), &clock, &store)
            .await
            .unwrap();
        let second = handle_record_referral(&referral(1, 3, Some("Math")), &clock, &store)
            .await
            .unwrap();

        // Assert
        assert_eq!(first, ReferralOutcome::Recorded { referrals: 1 });
        assert_eq!(second, ReferralOutcome::Recorded { referrals: 2 });
        let inviter = store.user(user_id(1)).unwrap();
        assert_eq!(inviter.referral_count(&dept("Math")), 2);
        assert_eq!(inviter.referral_count(&dept("Physics")), 0);

        let trail = store.referrals();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].invited_id, user_id(2));
        assert_eq!(trail[0].recorded_at, fixed_now());
    }

    #[tokio::test]
    async fn test_handle_record_referral_ignores_self_referral() {
        let store = InMemoryStore::new();
        let clock = FixedClock(fixed_now());
        register(&store, user_id(4)).await;

        let outcome = handle_record_referral(&referral(4, 4, Some("Math")), &clock, &store)
            .await
            .unwrap();

        assert_eq!(outcome, ReferralOutcome::SelfReferral);
        assert!(store.user(user_id(4)).unwrap().referral_counts.is_empty());
        assert!(store.referrals().is_empty());
    }

    #[tokio::test]
    async fn test_handle_record_referral_ignores_missing_department_and_unknown_inviter() {
        let store = InMemoryStore::new();
        let clock = FixedClock(fixed_now());
        register(&store, user_id(1)).await;

        let no_dept = handle_record_referral(&referral(1, 2, None), &clock, &store)
            .await
            .unwrap();
        let unknown = handle_record_referral(&referral(50, 2, Some("Math")), &clock, &store)
            .await
            .unwrap();

        assert_eq!(no_dept, ReferralOutcome::MissingDepartment);
        assert_eq!(unknown, ReferralOutcome::UnknownInviter);
        assert!(store.referrals().is_empty());
    }

    #[tokio::test]
    async fn test_handle_check_unlock_reports_newly_unlocked_exactly_once() {
        // Arrange
        let store = InMemoryStore::new();
        let clock = FixedClock(fixed_now());
        register(&store, user_id(1)).await;
        handle_record_referral(&referral(1, 2, Some("Math")), &clock, &store)
            .await
            .unwrap();

        // Act
        let before = handle_check_unlock(&check(1, "Math"), &store, &store)
            .await
            .unwrap();
        handle_record_referral(&referral(1, 3, Some("Math")), &clock, &store)
            .await
            .unwrap();
        let first = handle_check_unlock(&check(1, "Math"), &store, &store)
            .await
            .unwrap();
        let again = handle_check_unlock(&check(1, "Math"), &store, &store)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            before,
            UnlockOutcome::StillLocked {
                referrals: 1,
                required: 2
            }
        );
        assert_eq!(first, UnlockOutcome::NewlyUnlocked);
        assert_eq!(again, UnlockOutcome::AlreadyUnlocked);
        assert!(store.user(user_id(1)).unwrap().is_unlocked(&dept("Math")));
    }

    #[tokio::test]
    async fn test_handle_check_unlock_is_scoped_per_department() {
        let store = InMemoryStore::new();
        let clock = FixedClock(fixed_now());
        register(&store, user_id(1)).await;
        for invited in [2, 3] {
            handle_record_referral(&referral(1, invited, Some("Math")), &clock, &store)
                .await
                .unwrap();
        }

        let math = handle_check_unlock(&check(1, "Math"), &store, &store)
            .await
            .unwrap();
        let physics = handle_check_unlock(&check(1, "Physics"), &store, &store)
            .await
            .unwrap();

        assert_eq!(math, UnlockOutcome::NewlyUnlocked);
        assert!(!physics.is_unlocked());
        assert!(!store.user(user_id(1)).unwrap().is_unlocked(&dept("Physics")));
    }

    #[tokio::test]
    async fn test_handle_check_unlock_errors() {
        let store = InMemoryStore::new();
        let missing = handle_check_unlock(&check(8, "Math"), &store, &store).await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));

        let failing = handle_check_unlock(&check(8, "Math"), &FailingStore, &FailingStore).await;
        assert!(matches!(failing, Err(DomainError::StorageUnavailable(_))));
    }
}
