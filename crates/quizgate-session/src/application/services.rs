//! The collaborators every session handler needs.

use quizgate_core::clock::Clock;
use quizgate_core::repository::{
    ContentStore, LeaderboardStore, MembershipChecker, ReferralStore, UserStore,
};
use quizgate_referral::domain::link::LinkBuilder;

use crate::application::locks::UserLocks;

/// Borrowed handles to the stores and shared helpers.
#[derive(Clone, Copy)]
pub struct QuizServices<'a> {
    /// User documents and embedded sessions.
    pub users: &'a dyn UserStore,
    /// Departments, questions and ads.
    pub content: &'a dyn ContentStore,
    /// Referral trail and unlock flags.
    pub referrals: &'a dyn ReferralStore,
    /// Attempt tallies.
    pub leaderboard: &'a dyn LeaderboardStore,
    /// Channel membership gate checked before a quiz starts.
    pub membership: &'a dyn MembershipChecker,
    /// Per-user transition locks.
    pub locks: &'a UserLocks,
    /// Deep-link builder.
    pub links: &'a LinkBuilder,
    /// Time source.
    pub clock: &'a dyn Clock,
}
