//! Row shapes and their conversion into domain records.

use chrono::{DateTime, Utc};
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::{Ad, AdKind, Choice, Department, Options, Question, Session};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{StoreError, column_u32, column_u64};

pub(crate) fn department_id(raw: &str) -> Result<DepartmentId, StoreError> {
    DepartmentId::new(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn user_id(raw: i64) -> Result<UserId, StoreError> {
    UserId::new(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

#[derive(Debug, FromRow)]
pub(crate) struct DepartmentRow {
    pub id: String,
    pub display_name: String,
    pub is_active: bool,
    pub total_questions: i32,
}

impl TryFrom<DepartmentRow> for Department {
    type Error = StoreError;

    fn try_from(row: DepartmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: department_id(&row.id)?,
            display_name: row.display_name,
            is_active: row.is_active,
            total_questions: column_u32(row.total_questions, "total_questions")?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct QuestionRow {
    pub department_id: String,
    pub question_number: i32,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: String,
    pub explanation: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let answer: Choice = row
            .answer
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("answer is {:?}", row.answer)))?;
        Ok(Self {
            department_id: department_id(&row.department_id)?,
            question_number: column_u32(row.question_number, "question_number")?,
            question_text: row.question_text,
            options: Options {
                a: row.option_a,
                b: row.option_b,
                c: row.option_c,
                d: row.option_d,
            },
            answer,
            explanation: row.explanation,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AdRow {
    pub id: Uuid,
    pub kind: String,
    pub media_ref: Option<String>,
    pub body: Option<String>,
    pub caption: String,
    pub order_index: i64,
    pub is_active: bool,
}

impl TryFrom<AdRow> for Ad {
    type Error = StoreError;

    fn try_from(row: AdRow) -> Result<Self, Self::Error> {
        let missing = |column: &str| StoreError::Corrupt(format!("ad {} has no {column}", row.id));
        let kind = match row.kind.as_str() {
            "photo" => AdKind::Photo {
                media_ref: row.media_ref.clone().ok_or_else(|| missing("media_ref"))?,
            },
            "video" => AdKind::Video {
                media_ref: row.media_ref.clone().ok_or_else(|| missing("media_ref"))?,
            },
            "text" => AdKind::Text {
                body: row.body.clone().ok_or_else(|| missing("body"))?,
            },
            other => return Err(StoreError::Corrupt(format!("unknown ad kind {other:?}"))),
        };
        Ok(Self {
            id: row.id,
            kind,
            caption: row.caption,
            order_index: row.order_index,
            is_active: row.is_active,
        })
    }
}

/// Splits an ad payload into its `(kind, media_ref, body)` columns.
pub(crate) fn ad_columns(kind: &AdKind) -> (&'static str, Option<&str>, Option<&str>) {
    match kind {
        AdKind::Photo { media_ref } => ("photo", Some(media_ref.as_str()), None),
        AdKind::Video { media_ref } => ("video", Some(media_ref.as_str()), None),
        AdKind::Text { body } => ("text", None, Some(body.as_str())),
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub total_attempts: i64,
    pub total_correct: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct UserDepartmentRow {
    pub department_id: String,
    pub referral_count: i32,
    pub unlocked: bool,
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionRow {
    pub department_id: String,
    pub current_question_index: i32,
    pub correct_in_session: i32,
    pub attempted_in_session: i32,
    pub ad_break_counter: i32,
    pub session_active: bool,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            department_id: department_id(&row.department_id)?,
            current_question_index: column_u32(
                row.current_question_index,
                "current_question_index",
            )?,
            correct_in_session: column_u32(row.correct_in_session, "correct_in_session")?,
            attempted_in_session: column_u32(row.attempted_in_session, "attempted_in_session")?,
            ad_break_counter: column_u32(row.ad_break_counter, "ad_break_counter")?,
            session_active: row.session_active,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LeaderboardRow {
    pub user_id: i64,
    pub department_id: String,
    pub attempts: i64,
    pub correct: i64,
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardRow {
    pub(crate) fn counts(&self) -> Result<(u64, u64), StoreError> {
        Ok((
            column_u64(self.attempts, "attempts")?,
            column_u64(self.correct, "correct")?,
        ))
    }
}
