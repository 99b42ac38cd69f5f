//! Gating policy applied every time a question is due.
//!
//! The checks run in a fixed order: the preview lock at question 26, then
//! completion, then the ad-break cadence.

use quizgate_core::model::Session;
use quizgate_core::policy::{AD_INTERVAL, PREVIEW_SIZE, QUIZ_LENGTH};

/// What the delivery pipeline should do for the session's current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The preview is used up and the department is not unlocked.
    Locked,
    /// Every question has been answered.
    Completed,
    /// Serve the due question, preceded by an ad when `ad_break` is set.
    Question {
        /// Whether an ad break is due before the question.
        ad_break: bool,
    },
}

/// Evaluates the gate for `session`.
///
/// The lock fires only at exactly [`PREVIEW_SIZE`]: indexes below it are
/// served regardless of lock state, and the cursor cannot pass it while
/// locked.
#[must_use]
pub fn evaluate(session: &Session, unlocked: bool) -> Gate {
    let index = session.current_question_index;
    if index == PREVIEW_SIZE && !unlocked {
        Gate::Locked
    } else if index >= QUIZ_LENGTH {
        Gate::Completed
    } else {
        Gate::Question {
            ad_break: index > 0 && index % AD_INTERVAL == 0,
        }
    }
}
