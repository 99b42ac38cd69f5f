//! Unlock policy.
//!
//! A department unlocks for a user once that user has credited
//! [`UNLOCK_THRESHOLD`] referrals scoped to it. Unlocking is permanent and
//! independent per department.

use quizgate_core::policy::UNLOCK_THRESHOLD;
use serde::Serialize;

/// What a referral-count check concludes before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockDecision {
    /// The flag is already set; nothing to do.
    AlreadyUnlocked,
    /// The threshold is met and the flag should be set.
    Eligible,
    /// More referrals are needed.
    StillLocked {
        /// Referrals credited so far.
        referrals: u32,
    },
}

/// Decides whether `(user, department)` should be unlocked.
#[must_use]
pub fn decide(referrals: u32, already_unlocked: bool) -> UnlockDecision {
    if already_unlocked {
        UnlockDecision::AlreadyUnlocked
    } else if referrals >= UNLOCK_THRESHOLD {
        UnlockDecision::Eligible
    } else {
        UnlockDecision::StillLocked { referrals }
    }
}

/// Result of an unlock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnlockOutcome {
    /// This call flipped the flag. Reported once per (user, department).
    NewlyUnlocked,
    /// The department was unlocked earlier.
    AlreadyUnlocked,
    /// More referrals are needed.
    StillLocked {
        /// Referrals credited so far.
        referrals: u32,
        /// Referrals needed in total.
        required: u32,
    },
}

impl UnlockOutcome {
    /// Whether the department is unlocked after the check.
    #[must_use]
    pub fn is_unlocked(self) -> bool {
        !matches!(self, Self::StillLocked { .. })
    }
}

/// Result of recording an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferralOutcome {
    /// The invite was recorded; `referrals` is the inviter's new count.
    Recorded {
        /// The inviter's referral count for the department.
        referrals: u32,
    },
    /// The user followed their own link.
    SelfReferral,
    /// The link carried no department.
    MissingDepartment,
    /// The inviter is not a known user.
    UnknownInviter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_requires_threshold() {
        assert_eq!(decide(0, false), UnlockDecision::StillLocked { referrals: 0 });
        assert_eq!(decide(1, false), UnlockDecision::StillLocked { referrals: 1 });
        assert_eq!(decide(2, false), UnlockDecision::Eligible);
        assert_eq!(decide(9, false), UnlockDecision::Eligible);
    }

    #[test]
    fn test_decide_is_a_no_op_once_unlocked() {
        assert_eq!(decide(0, true), UnlockDecision::AlreadyUnlocked);
        assert_eq!(decide(5, true), UnlockDecision::AlreadyUnlocked);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(UnlockOutcome::StillLocked {
            referrals: 1,
            required: 2,
        })
        .unwrap();
        assert_eq!(json["status"], "still_locked");
        assert_eq!(json["required"], 2);
    }
}
