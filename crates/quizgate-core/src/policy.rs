//! Fixed business policy for quiz progression.
//!
//! These values are not user-configurable.

/// Number of questions in a full quiz run.
pub const QUIZ_LENGTH: u32 = 100;

/// Questions a user may answer before the department locks.
pub const PREVIEW_SIZE: u32 = 25;

/// Department-scoped referrals required to lift the preview cap.
pub const UNLOCK_THRESHOLD: u32 = 2;

/// An ad break is due every time this many questions have been answered.
pub const AD_INTERVAL: u32 = 5;
