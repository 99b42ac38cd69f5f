//! Shared application state.

use std::sync::Arc;

use quizgate_core::clock::Clock;
use quizgate_core::ids::UserId;
use quizgate_core::repository::{
    ContentStore, LeaderboardStore, MembershipChecker, MembershipStore, OpenMembership,
    ReferralStore, UserStore,
};
use quizgate_referral::domain::link::LinkBuilder;
use quizgate_session::application::locks::UserLocks;
use quizgate_session::application::services::QuizServices;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// User documents and embedded sessions.
    pub users: Arc<dyn UserStore>,
    /// Departments, questions and ads.
    pub content: Arc<dyn ContentStore>,
    /// Referral trail and unlock flags.
    pub referrals: Arc<dyn ReferralStore>,
    /// Attempt tallies.
    pub leaderboard: Arc<dyn LeaderboardStore>,
    /// Reported channel memberships.
    pub memberships: Arc<dyn MembershipStore>,
    /// Gate checked before a quiz starts. Admits everyone unless
    /// [`AppState::with_membership_gate`] installs a checker.
    pub membership_gate: Arc<dyn MembershipChecker>,
    /// Clock for deterministic timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Per-user session locks.
    pub locks: Arc<UserLocks>,
    /// Deep-link builder.
    pub links: Arc<LinkBuilder>,
    /// The user allowed on admin routes.
    pub admin_user_id: Option<UserId>,
}

impl AppState {
    /// Create new application state backed by one store serving every
    /// repository trait.
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock + Send + Sync>,
        links: LinkBuilder,
        admin_user_id: Option<UserId>,
    ) -> Self
    where
        S: UserStore + ContentStore + ReferralStore + LeaderboardStore + MembershipStore + 'static,
    {
        Self {
            users: store.clone(),
            content: store.clone(),
            referrals: store.clone(),
            leaderboard: store.clone(),
            memberships: store,
            membership_gate: Arc::new(OpenMembership),
            clock,
            locks: Arc::new(UserLocks::new()),
            links: Arc::new(links),
            admin_user_id,
        }
    }

    /// Requires channel membership, as checked by `gate`, before a quiz
    /// starts.
    #[must_use]
    pub fn with_membership_gate(mut self, gate: Arc<dyn MembershipChecker>) -> Self {
        self.membership_gate = gate;
        self
    }

    /// Borrows the collaborators the session handlers need.
    #[must_use]
    pub fn services(&self) -> QuizServices<'_> {
        QuizServices {
            users: &*self.users,
            content: &*self.content,
            referrals: &*self.referrals,
            leaderboard: &*self.leaderboard,
            membership: &*self.membership_gate,
            locks: &self.locks,
            links: &self.links,
            clock: &*self.clock,
        }
    }
}
