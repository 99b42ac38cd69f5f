//! What the delivery pipeline hands to the transport.

use quizgate_content::application::query_handlers::QuestionView;
use quizgate_core::model::{Ad, SessionSummary};
use serde::Serialize;

/// Outcome of running the delivery pipeline once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    /// The due question, optionally preceded by an ad.
    Question {
        /// Ad to show before the question.
        ad_break: Option<Ad>,
        /// The question, without its answer key.
        question: QuestionView,
    },
    /// The preview is used up; the user must invite friends to continue.
    Locked {
        /// Progress so far.
        summary: SessionSummary,
        /// Department-scoped referral link for the user to share.
        referral_link: String,
        /// Referrals credited so far.
        referrals: u32,
        /// Referrals needed to unlock.
        required: u32,
    },
    /// The quiz is finished and the session is closed.
    Completed {
        /// Final results.
        summary: SessionSummary,
    },
    /// The due question is missing from the bank; the session was closed.
    NotFound {
        /// Ad shown before the lookup failed.
        ad_break: Option<Ad>,
        /// The question number that was looked up.
        question_number: u32,
        /// Progress at the point of failure.
        summary: SessionSummary,
    },
}

impl Delivery {
    /// Returns the served question number, if a question was served.
    #[must_use]
    pub fn question_number(&self) -> Option<u32> {
        match self {
            Self::Question { question, .. } => Some(question.question_number),
            _ => None,
        }
    }
}
