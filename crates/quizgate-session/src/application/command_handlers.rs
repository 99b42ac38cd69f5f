//! Command handlers for the Quiz Session & Delivery context.
//!
//! Every handler that touches a session holds the user's lock from
//! [`UserLocks`](crate::application::locks::UserLocks) for its whole
//! duration, so transitions of one user never interleave.

use quizgate_content::application::query_handlers::{
    self as content_queries, DepartmentView, QuestionView,
};
use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Ad, AnswerDelta, Choice, Session, SessionSummary, User};
use quizgate_core::policy::{PREVIEW_SIZE, UNLOCK_THRESHOLD};
use quizgate_leaderboard::application::command_handlers::handle_record_attempt;
use quizgate_leaderboard::domain::commands::RecordAttempt;
use quizgate_referral::application::command_handlers::{
    handle_check_unlock, handle_record_referral,
};
use quizgate_referral::domain::commands::{CheckUnlock, RecordReferral};
use quizgate_referral::domain::link::{ReferralCode, StartParam};
use quizgate_referral::domain::unlock::{ReferralOutcome, UnlockOutcome};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::services::QuizServices;
use crate::domain::commands::{
    AdvanceQuiz, CheckUnlockStatus, EnrollUser, PauseQuiz, ResumeQuiz, StartQuiz, SubmitAnswer,
};
use crate::domain::delivery::Delivery;
use crate::domain::gating::{self, Gate};

/// Feedback for an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    /// The question that was answered.
    pub question_number: u32,
    /// Whether the chosen option was right.
    pub correct: bool,
    /// The right option.
    pub correct_choice: Choice,
    /// Text of the right option.
    pub correct_text: String,
    /// Explanation of the answer.
    pub explanation: String,
    /// The session after the answer was applied.
    pub session: Session,
}

/// Notice that an inviter just unlocked a department, for the transport to
/// forward to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InviterUnlocked {
    /// The inviter.
    pub inviter_id: UserId,
    /// The department they unlocked.
    pub department_id: DepartmentId,
}

/// Result of a user opening the bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    /// The arriving user.
    pub user_id: UserId,
    /// Whether this was the user's first contact.
    pub created: bool,
    /// Set when the arrival unlocked a department for the inviter.
    pub inviter_unlocked: Option<InviterUnlocked>,
    /// Summary of an unfinished active session the user may resume.
    pub resume: Option<SessionSummary>,
    /// Departments a quiz can be started in.
    pub departments: Vec<DepartmentView>,
    /// Set when a department link started a quiz directly.
    pub delivery: Option<Delivery>,
}

/// Result of a lock-screen unlock check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockStatus {
    /// The department checked.
    pub department_id: DepartmentId,
    /// Whether the department is unlocked now.
    pub outcome: UnlockOutcome,
    /// The user's shareable link for the department.
    pub referral_link: String,
    /// Set when a session waiting at the lock continued.
    pub delivery: Option<Delivery>,
}

async fn load_user(user_id: UserId, services: &QuizServices<'_>) -> Result<User, DomainError> {
    services
        .users
        .get(user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {user_id}")))
}

/// Admits only channel members. A failed check denies access.
async fn require_member(
    user_id: UserId,
    correlation_id: Uuid,
    services: &QuizServices<'_>,
) -> Result<(), DomainError> {
    match services.membership.is_member(user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            info!(correlation_id = %correlation_id, user_id = %user_id, "not a channel member, access denied");
            Err(DomainError::Forbidden(format!(
                "user {user_id} has not joined the required channel"
            )))
        }
        Err(e) => {
            warn!(
                correlation_id = %correlation_id,
                user_id = %user_id,
                error = %e,
                "membership check failed, access denied"
            );
            Err(DomainError::Forbidden(
                "channel membership could not be verified".to_owned(),
            ))
        }
    }
}

/// Picks the ad for the next break and persists the advanced counter.
/// Content listing failures skip the ad.
async fn take_ad_break(
    user_id: UserId,
    session: &mut Session,
    services: &QuizServices<'_>,
) -> Result<Option<Ad>, DomainError> {
    let rotation = match content_queries::ad_rotation(services.content).await {
        Ok(rotation) => rotation,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "ad listing failed, skipping ad break");
            return Ok(None);
        }
    };
    let Some(ad) =
        quizgate_content::domain::rotation::next_ad(&rotation, session.ad_break_counter).cloned()
    else {
        return Ok(None);
    };
    session.record_ad_break();
    services.users.save_session(user_id, session).await?;
    Ok(Some(ad))
}

/// Runs the delivery pipeline for the session's current index.
async fn deliver(
    user: &User,
    mut session: Session,
    correlation_id: Uuid,
    services: &QuizServices<'_>,
) -> Result<Delivery, DomainError> {
    let department_id = session.department_id.clone();
    match gating::evaluate(&session, user.is_unlocked(&department_id)) {
        Gate::Locked => {
            info!(
                correlation_id = %correlation_id,
                user_id = %user.id,
                department_id = %department_id,
                "preview exhausted, department locked"
            );
            Ok(Delivery::Locked {
                summary: session.summary(),
                referral_link: services
                    .links
                    .referral_link(&ReferralCode::new(user.id, department_id.clone())),
                referrals: user.referral_count(&department_id),
                required: UNLOCK_THRESHOLD,
            })
        }
        Gate::Completed => {
            session.deactivate();
            services.users.save_session(user.id, &session).await?;
            info!(
                correlation_id = %correlation_id,
                user_id = %user.id,
                department_id = %department_id,
                "quiz completed"
            );
            Ok(Delivery::Completed {
                summary: session.summary(),
            })
        }
        Gate::Question { ad_break } => {
            let ad_break = if ad_break {
                take_ad_break(user.id, &mut session, services).await?
            } else {
                None
            };
            let question_number = session.due_question_number();
            match services
                .content
                .get_question(&department_id, question_number)
                .await?
            {
                Some(question) => Ok(Delivery::Question {
                    ad_break,
                    question: QuestionView::from(&question),
                }),
                None => {
                    session.deactivate();
                    services.users.save_session(user.id, &session).await?;
                    error!(
                        correlation_id = %correlation_id,
                        user_id = %user.id,
                        department_id = %department_id,
                        question_number,
                        "question missing from bank, session closed"
                    );
                    Ok(Delivery::NotFound {
                        ad_break,
                        question_number,
                        summary: session.summary(),
                    })
                }
            }
        }
    }
}

/// Starts a fresh session and delivers its first question. The caller holds
/// the user's lock.
async fn start_locked(
    user_id: UserId,
    department_id: &DepartmentId,
    correlation_id: Uuid,
    services: &QuizServices<'_>,
) -> Result<Delivery, DomainError> {
    content_queries::require_playable_department(department_id, services.content).await?;
    let user = load_user(user_id, services).await?;

    let session = Session::start(department_id.clone());
    services.users.save_session(user_id, &session).await?;
    info!(
        correlation_id = %correlation_id,
        user_id = %user_id,
        department_id = %department_id,
        "quiz started"
    );

    deliver(&user, session, correlation_id, services).await
}

/// Handles the `StartQuiz` command: replaces any previous session with a
/// fresh one at question 1 and delivers it.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` unless the user is a channel member,
/// `DomainError::InvalidDepartment` if the department is unknown, inactive
/// or empty, `DomainError::NotFound` if the user never enrolled, or the
/// store's error.
pub async fn handle_start_quiz(
    command: &StartQuiz,
    services: &QuizServices<'_>,
) -> Result<Delivery, DomainError> {
    require_member(command.user_id, command.correlation_id, services).await?;
    let _guard = services.locks.acquire(command.user_id).await;
    start_locked(
        command.user_id,
        &command.department_id,
        command.correlation_id,
        services,
    )
    .await
}

/// Handles the `SubmitAnswer` command: validates the claimed question
/// number against the session cursor, grades the answer and applies the
/// counter increments as one store operation.
///
/// The leaderboard tally is updated afterwards on a best-effort basis.
///
/// # Errors
///
/// Returns `DomainError::SessionExpired` without an active unfinished
/// session, `DomainError::StaleAnswer` when the claim is not the due
/// question, `DomainError::Forbidden` while the session waits at the
/// preview lock, `DomainError::NotFound` if the question is missing, or the
/// store's error. None of these change any counter.
pub async fn handle_submit_answer(
    command: &SubmitAnswer,
    services: &QuizServices<'_>,
) -> Result<AnswerFeedback, DomainError> {
    let _guard = services.locks.acquire(command.user_id).await;

    let user = load_user(command.user_id, services).await?;
    let session = user
        .active_session()
        .filter(|s| !s.is_complete())
        .ok_or(DomainError::SessionExpired(command.user_id))?;
    session.validate_claim(command.question_number)?;
    if gating::evaluate(session, user.is_unlocked(&session.department_id)) == Gate::Locked {
        return Err(DomainError::Forbidden(format!(
            "{} is locked until {UNLOCK_THRESHOLD} referrals unlock it",
            session.department_id
        )));
    }

    let department_id = session.department_id.clone();
    let question = services
        .content
        .get_question(&department_id, command.question_number)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound(format!(
                "question {} of {department_id}",
                command.question_number
            ))
        })?;
    let correct = question.is_correct(command.choice);

    let updated = services
        .users
        .apply_answer(
            command.user_id,
            AnswerDelta {
                expected_index: session.current_question_index,
                correct,
            },
        )
        .await?;
    info!(
        correlation_id = %command.correlation_id,
        user_id = %command.user_id,
        department_id = %department_id,
        question_number = command.question_number,
        correct,
        "answer recorded"
    );

    // The answer is already committed; a lost tally is only logged, with
    // enough fields to replay it into the leaderboard.
    let attempt = RecordAttempt {
        correlation_id: command.correlation_id,
        user_id: command.user_id,
        department_id,
        correct,
    };
    if let Err(e) = handle_record_attempt(&attempt, services.clock, services.leaderboard).await {
        warn!(
            correlation_id = %command.correlation_id,
            user_id = %attempt.user_id,
            department_id = %attempt.department_id,
            correct = attempt.correct,
            answered_at = %services.clock.now().to_rfc3339(),
            error = %e,
            "leaderboard update failed, attempt not tallied"
        );
    }

    Ok(AnswerFeedback {
        question_number: command.question_number,
        correct,
        correct_choice: question.answer,
        correct_text: question.options.get(question.answer).to_owned(),
        explanation: question.explanation_or_default().to_owned(),
        session: updated,
    })
}

/// Handles the `AdvanceQuiz` command: re-runs delivery from the persisted
/// cursor without consuming an index.
///
/// # Errors
///
/// Returns `DomainError::SessionExpired` without an active session, or the
/// store's error.
pub async fn handle_advance_quiz(
    command: &AdvanceQuiz,
    services: &QuizServices<'_>,
) -> Result<Delivery, DomainError> {
    let _guard = services.locks.acquire(command.user_id).await;

    let user = load_user(command.user_id, services).await?;
    let session = user
        .active_session()
        .cloned()
        .ok_or(DomainError::SessionExpired(command.user_id))?;
    deliver(&user, session, command.correlation_id, services).await
}

/// Handles the `PauseQuiz` command: stops serving questions while keeping
/// every counter, and returns the progress summary.
///
/// # Errors
///
/// Returns `DomainError::SessionExpired` if the user has no session, or the
/// store's error.
pub async fn handle_pause_quiz(
    command: &PauseQuiz,
    services: &QuizServices<'_>,
) -> Result<SessionSummary, DomainError> {
    let _guard = services.locks.acquire(command.user_id).await;

    let user = load_user(command.user_id, services).await?;
    let mut session = user
        .session
        .ok_or(DomainError::SessionExpired(command.user_id))?;
    if session.session_active {
        session.deactivate();
        services
            .users
            .save_session(command.user_id, &session)
            .await?;
        info!(
            correlation_id = %command.correlation_id,
            user_id = %command.user_id,
            department_id = %session.department_id,
            "quiz paused"
        );
    }
    Ok(session.summary())
}

/// Handles the `ResumeQuiz` command: re-activates a paused session at its
/// saved position and delivers what is due.
///
/// # Errors
///
/// Returns `DomainError::SessionExpired` if the user has no session or it
/// was completed, or the store's error.
pub async fn handle_resume_quiz(
    command: &ResumeQuiz,
    services: &QuizServices<'_>,
) -> Result<Delivery, DomainError> {
    let _guard = services.locks.acquire(command.user_id).await;

    let user = load_user(command.user_id, services).await?;
    let mut session = user
        .session
        .clone()
        .filter(|s| !s.is_complete())
        .ok_or(DomainError::SessionExpired(command.user_id))?;
    if !session.session_active {
        session.reactivate();
        services
            .users
            .save_session(command.user_id, &session)
            .await?;
        info!(
            correlation_id = %command.correlation_id,
            user_id = %command.user_id,
            department_id = %session.department_id,
            "quiz resumed"
        );
    }
    deliver(&user, session, command.correlation_id, services).await
}

/// Credits the inviter on a first contact and reports a fresh unlock.
/// Failures are logged and swallowed: they must not affect the arriving
/// user.
async fn credit_inviter(
    command: &EnrollUser,
    code: ReferralCode,
    services: &QuizServices<'_>,
) -> Option<InviterUnlocked> {
    let record = RecordReferral {
        correlation_id: command.correlation_id,
        inviter_id: code.inviter,
        invited_id: command.user_id,
        department_id: code.department.clone(),
    };
    match handle_record_referral(&record, services.clock, services.referrals).await {
        Ok(ReferralOutcome::Recorded { .. }) => {}
        Ok(outcome) => {
            debug!(correlation_id = %command.correlation_id, ?outcome, "referral not credited");
            return None;
        }
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                inviter_id = %code.inviter,
                error = %e,
                "referral recording failed"
            );
            return None;
        }
    }

    let department_id = code.department?;
    let check = CheckUnlock {
        correlation_id: command.correlation_id,
        user_id: code.inviter,
        department_id: department_id.clone(),
    };
    match handle_check_unlock(&check, services.users, services.referrals).await {
        Ok(UnlockOutcome::NewlyUnlocked) => Some(InviterUnlocked {
            inviter_id: code.inviter,
            department_id,
        }),
        Ok(_) => None,
        Err(e) => {
            warn!(
                correlation_id = %command.correlation_id,
                inviter_id = %code.inviter,
                error = %e,
                "inviter unlock check failed"
            );
            None
        }
    }
}

/// Handles the `EnrollUser` command: creates the user on first contact (or
/// refreshes their profile), credits a referral from the deep link on first
/// contact only, and opens a linked department directly unless an
/// unfinished session is waiting to be resumed.
///
/// The referral is credited before the membership gate, so an invite
/// counts even when the newcomer has not joined the channel yet.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` unless the user is a channel member,
/// or the store's error if the user cannot be created or loaded, or the
/// department listing fails.
pub async fn handle_enroll_user(
    command: &EnrollUser,
    services: &QuizServices<'_>,
) -> Result<Enrollment, DomainError> {
    let start = StartParam::parse(command.start_param.as_deref());

    let created = services
        .users
        .create(&User::new(
            command.user_id,
            command.profile.clone(),
            services.clock.now(),
        ))
        .await?;
    if created {
        info!(
            correlation_id = %command.correlation_id,
            user_id = %command.user_id,
            "user enrolled"
        );
    } else {
        services
            .users
            .update_profile(command.user_id, &command.profile)
            .await?;
    }

    let inviter_unlocked = match start.clone() {
        StartParam::Referral(code) if created => credit_inviter(command, code, services).await,
        _ => None,
    };

    require_member(command.user_id, command.correlation_id, services).await?;

    let delivery = match start {
        StartParam::Department(department_id) => {
            let _guard = services.locks.acquire(command.user_id).await;
            let unfinished = load_user(command.user_id, services)
                .await?
                .active_session()
                .is_some_and(|s| !s.is_complete());
            if unfinished {
                debug!(
                    correlation_id = %command.correlation_id,
                    user_id = %command.user_id,
                    department_id = %department_id,
                    "unfinished session, offering resume instead of department link"
                );
                None
            } else {
                match start_locked(
                    command.user_id,
                    &department_id,
                    command.correlation_id,
                    services,
                )
                .await
                {
                    Ok(delivery) => Some(delivery),
                    Err(DomainError::InvalidDepartment(reason)) => {
                        debug!(correlation_id = %command.correlation_id, %reason, "ignoring department link");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        _ => None,
    };

    let user = load_user(command.user_id, services).await?;
    let resume = if delivery.is_none() {
        user.active_session()
            .filter(|s| !s.is_complete())
            .map(Session::summary)
    } else {
        None
    };

    Ok(Enrollment {
        user_id: command.user_id,
        created,
        inviter_unlocked,
        resume,
        departments: content_queries::list_departments(services.content).await?,
        delivery,
    })
}

/// Handles the `CheckUnlockStatus` command: runs the unlock check for the
/// user and, when a session waiting at the preview lock can now continue,
/// delivers the next question.
///
/// # Errors
///
/// Returns `DomainError::Validation` when no department is given and the
/// user has no session, `DomainError::NotFound` if the user does not exist,
/// or the store's error.
pub async fn handle_check_unlock_status(
    command: &CheckUnlockStatus,
    services: &QuizServices<'_>,
) -> Result<UnlockStatus, DomainError> {
    let _guard = services.locks.acquire(command.user_id).await;

    let user = load_user(command.user_id, services).await?;
    let department_id = command
        .department_id
        .clone()
        .or_else(|| user.session.as_ref().map(|s| s.department_id.clone()))
        .ok_or_else(|| DomainError::Validation("a department is required".to_owned()))?;

    let outcome = handle_check_unlock(
        &CheckUnlock {
            correlation_id: command.correlation_id,
            user_id: command.user_id,
            department_id: department_id.clone(),
        },
        services.users,
        services.referrals,
    )
    .await?;

    let waiting_at_lock = user
        .active_session()
        .filter(|s| s.department_id == department_id && s.current_question_index == PREVIEW_SIZE)
        .cloned();
    let delivery = match waiting_at_lock {
        Some(session) if outcome.is_unlocked() => {
            let user = load_user(command.user_id, services).await?;
            Some(deliver(&user, session, command.correlation_id, services).await?)
        }
        _ => None,
    };

    Ok(UnlockStatus {
        referral_link: services
            .links
            .referral_link(&ReferralCode::new(command.user_id, department_id.clone())),
        department_id,
        outcome,
        delivery,
    })
}
