//! Persisted record shapes shared across bounded contexts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::ids::{DepartmentId, UserId};
use crate::policy::QUIZ_LENGTH;

/// One of the four answer options of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    /// Option A.
    A,
    /// Option B.
    B,
    /// Option C.
    C,
    /// Option D.
    D,
}

impl Choice {
    /// All choices in presentation order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Returns the lowercase letter used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
            Self::D => "d",
        }
    }
}

impl FromStr for Choice {
    type Err = DomainError;

    /// Parses a choice letter, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            "c" => Ok(Self::C),
            "d" => Ok(Self::D),
            other => Err(DomainError::Validation(format!(
                "choice must be one of a, b, c, d; got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four option texts of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Text of option A.
    pub a: String,
    /// Text of option B.
    pub b: String,
    /// Text of option C.
    pub c: String,
    /// Text of option D.
    pub d: String,
}

impl Options {
    /// Returns the text for `choice`.
    #[must_use]
    pub fn get(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.a,
            Choice::B => &self.b,
            Choice::C => &self.c,
            Choice::D => &self.d,
        }
    }
}

/// A single question within a department, keyed by its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Department the question belongs to.
    pub department_id: DepartmentId,
    /// 1-based ordinal, unique within the department.
    pub question_number: u32,
    /// The question prompt.
    pub question_text: String,
    /// Option texts.
    pub options: Options,
    /// The correct option.
    pub answer: Choice,
    /// Optional explanation shown after answering.
    pub explanation: Option<String>,
}

impl Question {
    /// Explanation used when the question carries none.
    pub const DEFAULT_EXPLANATION: &'static str = "No explanation provided.";

    /// Returns `true` if `choice` matches the answer key.
    #[must_use]
    pub fn is_correct(&self, choice: Choice) -> bool {
        self.answer == choice
    }

    /// Returns the explanation, or the default text when absent.
    #[must_use]
    pub fn explanation_or_default(&self) -> &str {
        self.explanation
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(Self::DEFAULT_EXPLANATION)
    }
}

/// A named question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Department identifier.
    pub id: DepartmentId,
    /// Human-readable name.
    pub display_name: String,
    /// Whether the department is offered to users.
    pub is_active: bool,
    /// Number of ingested questions.
    pub total_questions: u32,
}

impl Department {
    /// Returns `true` if a quiz may be started in this department.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.is_active && self.total_questions > 0
    }
}

/// Content of a sponsored interstitial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdKind {
    /// An image referenced by a platform media id.
    Photo {
        /// Platform media reference.
        media_ref: String,
    },
    /// A video referenced by a platform media id.
    Video {
        /// Platform media reference.
        media_ref: String,
    },
    /// A plain text message.
    Text {
        /// Message body.
        body: String,
    },
}

/// A sponsored interstitial shown at ad breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    /// Ad identifier.
    pub id: Uuid,
    /// Media or text payload.
    #[serde(flatten)]
    pub kind: AdKind,
    /// Caption shown with media ads; may be empty.
    pub caption: String,
    /// Rotation position; lower values are shown first.
    pub order_index: i64,
    /// Whether the ad takes part in rotation.
    pub is_active: bool,
}

/// Display fields supplied by the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// First name, possibly empty.
    #[serde(default)]
    pub first_name: String,
    /// Last name, possibly empty.
    #[serde(default)]
    pub last_name: String,
    /// Platform username without the leading `@`, possibly empty.
    #[serde(default)]
    pub username: String,
}

/// Accuracy as a percentage, `0.0` when nothing was attempted.
#[must_use]
pub fn accuracy_percent(correct: u64, attempted: u64) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = correct as f64 / attempted as f64;
    ratio * 100.0
}

/// Summary of a session shown on lock, completion and pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Department of the session.
    pub department_id: DepartmentId,
    /// Questions answered in the session.
    pub attempted: u32,
    /// Correct answers in the session.
    pub correct: u32,
    /// `correct / attempted` as a percentage.
    pub accuracy_percent: f64,
}

/// Counter increments produced by one accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerDelta {
    /// The question index the answer was validated against.
    pub expected_index: u32,
    /// Whether the answer matched the key.
    pub correct: bool,
}

/// A user's single traversal of one department's questions.
///
/// `current_question_index` is the authoritative 0-based cursor and always
/// equals `attempted_in_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Department being played.
    pub department_id: DepartmentId,
    /// Number of the next question minus one.
    pub current_question_index: u32,
    /// Correct answers so far.
    pub correct_in_session: u32,
    /// Answers so far.
    pub attempted_in_session: u32,
    /// Ads shown so far; drives ad rotation.
    pub ad_break_counter: u32,
    /// Whether questions may be served.
    pub session_active: bool,
}

impl Session {
    /// Creates a fresh active session at question 1.
    #[must_use]
    pub fn start(department_id: DepartmentId) -> Self {
        Self {
            department_id,
            current_question_index: 0,
            correct_in_session: 0,
            attempted_in_session: 0,
            ad_break_counter: 0,
            session_active: true,
        }
    }

    /// Returns the 1-based number of the question currently due.
    #[must_use]
    pub fn due_question_number(&self) -> u32 {
        self.current_question_index + 1
    }

    /// Returns `true` once every question has been answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_question_index >= QUIZ_LENGTH
    }

    /// Rejects answers for any question other than the one due.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StaleAnswer` if `claimed` is not the due
    /// question number.
    pub fn validate_claim(&self, claimed: u32) -> Result<(), DomainError> {
        let expected = self.due_question_number();
        if claimed != expected {
            return Err(DomainError::StaleAnswer { expected, claimed });
        }
        Ok(())
    }

    /// Applies one accepted answer: the cursor and attempt counter advance
    /// together, the correct counter only when `correct`.
    pub fn record_answer(&mut self, correct: bool) {
        self.current_question_index += 1;
        self.attempted_in_session += 1;
        if correct {
            self.correct_in_session += 1;
        }
    }

    /// Records that an ad was shown.
    pub fn record_ad_break(&mut self) {
        self.ad_break_counter += 1;
    }

    /// Stops serving questions while keeping progress.
    pub fn deactivate(&mut self) {
        self.session_active = false;
    }

    /// Resumes serving questions from the saved position.
    pub fn reactivate(&mut self) {
        self.session_active = true;
    }

    /// Returns the summary of this session.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            department_id: self.department_id.clone(),
            attempted: self.attempted_in_session,
            correct: self.correct_in_session,
            accuracy_percent: accuracy_percent(
                u64::from(self.correct_in_session),
                u64::from(self.attempted_in_session),
            ),
        }
    }
}

/// A participant and everything the engine tracks about them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Platform user id.
    pub id: UserId,
    /// Display fields.
    pub profile: UserProfile,
    /// Answers across all sessions.
    pub total_attempts: u64,
    /// Correct answers across all sessions.
    pub total_correct: u64,
    /// Referrals credited to this user, per department.
    pub referral_counts: BTreeMap<DepartmentId, u32>,
    /// Departments this user unlocked past the preview.
    pub unlocked_departments: BTreeMap<DepartmentId, bool>,
    /// First contact time.
    pub created_at: DateTime<Utc>,
    /// The current or most recent session.
    pub session: Option<Session>,
}

impl User {
    /// Creates a user on first contact with zeroed counters.
    #[must_use]
    pub fn new(id: UserId, profile: UserProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            profile,
            total_attempts: 0,
            total_correct: 0,
            referral_counts: BTreeMap::new(),
            unlocked_departments: BTreeMap::new(),
            created_at,
            session: None,
        }
    }

    /// Referrals credited for `department`.
    #[must_use]
    pub fn referral_count(&self, department: &DepartmentId) -> u32 {
        self.referral_counts.get(department).copied().unwrap_or(0)
    }

    /// Whether `department` is unlocked past the preview.
    #[must_use]
    pub fn is_unlocked(&self, department: &DepartmentId) -> bool {
        self.unlocked_departments
            .get(department)
            .copied()
            .unwrap_or(false)
    }

    /// Returns the session if it is currently active.
    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|s| s.session_active)
    }

    /// Name shown on leaderboards: first name, then username, then the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.profile.first_name.trim().is_empty() {
            return self.profile.first_name.clone();
        }
        if !self.profile.username.trim().is_empty() {
            return self.profile.username.clone();
        }
        self.id.to_string()
    }
}

/// Append-only audit record of one invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    /// Record identifier.
    pub id: Uuid,
    /// User who shared the link.
    pub inviter_id: UserId,
    /// User who arrived through the link.
    pub invited_id: UserId,
    /// Department the link was scoped to.
    pub department_id: DepartmentId,
    /// When the invite was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Attempt and correct counts for one department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTally {
    /// Answers recorded.
    pub attempts: u64,
    /// Correct answers recorded.
    pub correct: u64,
}

impl DepartmentTally {
    /// Ratio of correct answers in `[0, 1]`, or `None` with no attempts.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.attempts == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.correct as f64 / self.attempts as f64;
        Some(ratio)
    }
}

/// Per-user leaderboard document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// The ranked user.
    pub user_id: UserId,
    /// Tallies per department.
    pub departments: BTreeMap<DepartmentId, DepartmentTally>,
    /// Time of the last recorded attempt.
    pub updated_at: DateTime<Utc>,
}

/// A user's standing in the required channel, as reported by the chat
/// platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Channel owner.
    Creator,
    /// Channel admin.
    Administrator,
    /// Regular subscriber.
    Member,
    /// Muted or otherwise restricted.
    Restricted,
    /// Left the channel.
    Left,
    /// Banned from the channel.
    Kicked,
}

impl MemberStatus {
    /// Returns the lowercase name used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
        }
    }

    /// Only owners, admins and regular subscribers may play.
    #[must_use]
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }
}

impl FromStr for MemberStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(Self::Creator),
            "administrator" => Ok(Self::Administrator),
            "member" => Ok(Self::Member),
            "restricted" => Ok(Self::Restricted),
            "left" => Ok(Self::Left),
            "kicked" => Ok(Self::Kicked),
            other => Err(DomainError::Validation(format!(
                "unknown membership status {other:?}"
            ))),
        }
    }
}
