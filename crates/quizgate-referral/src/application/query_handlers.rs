//! Query handlers for the Referral & Unlock context.

use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::policy::UNLOCK_THRESHOLD;
use quizgate_core::repository::UserStore;
use serde::Serialize;

use crate::domain::link::{LinkBuilder, ReferralCode};

/// Read-only view of a user's referral standing in one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralStatusView {
    /// The department.
    pub department_id: DepartmentId,
    /// Referrals credited so far.
    pub referrals: u32,
    /// Referrals needed to unlock.
    pub required: u32,
    /// Whether the department is unlocked.
    pub unlocked: bool,
    /// The user's shareable link for this department.
    pub referral_link: String,
}

/// Retrieves a user's referral standing for a department.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the user does not exist.
pub async fn get_referral_status(
    user_id: UserId,
    department_id: &DepartmentId,
    users: &dyn UserStore,
    links: &LinkBuilder,
) -> Result<ReferralStatusView, DomainError> {
    let user = users
        .get(user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {user_id}")))?;
    Ok(ReferralStatusView {
        department_id: department_id.clone(),
        referrals: user.referral_count(department_id),
        required: UNLOCK_THRESHOLD,
        unlocked: user.is_unlocked(department_id),
        referral_link: links.referral_link(&ReferralCode::new(user_id, department_id.clone())),
    })
}
