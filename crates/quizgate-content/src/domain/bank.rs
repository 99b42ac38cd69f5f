//! Question-bank parsing and validation.
//!
//! A bank is a list of questions as uploaded by an administrator, in JSON or
//! YAML. Every question must carry a unique positive `question_number`, four
//! non-empty options and an answer key in `a`–`d`.

use std::collections::BTreeSet;

use quizgate_core::error::DomainError;
use quizgate_core::ids::DepartmentId;
use quizgate_core::model::{Choice, Options, Question};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Encoding of an uploaded question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankFormat {
    /// A JSON array of questions.
    #[default]
    Json,
    /// A YAML sequence of questions.
    Yaml,
}

#[derive(Debug, Deserialize)]
struct RawOptions {
    a: String,
    b: String,
    c: String,
    d: String,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question_number: i64,
    question_text: String,
    options: RawOptions,
    answer: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// A validated question bank ready to be stored.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    /// Questions ordered by number.
    pub questions: Vec<Question>,
    /// SHA-256 of the uploaded source, hex encoded.
    pub content_hash: String,
}

impl QuestionBank {
    /// Parses and validates `source` for `department_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the source cannot be decoded,
    /// is empty, or any question is malformed.
    pub fn parse(
        department_id: &DepartmentId,
        format: BankFormat,
        source: &str,
    ) -> Result<Self, DomainError> {
        let raw: Vec<RawQuestion> = match format {
            BankFormat::Json => serde_json::from_str(source)
                .map_err(|e| DomainError::Validation(format!("invalid JSON question bank: {e}")))?,
            BankFormat::Yaml => serde_yaml::from_str(source)
                .map_err(|e| DomainError::Validation(format!("invalid YAML question bank: {e}")))?,
        };
        if raw.is_empty() {
            return Err(DomainError::Validation(
                "question bank contains no questions".to_owned(),
            ));
        }

        let mut seen = BTreeSet::new();
        let mut questions = Vec::with_capacity(raw.len());
        for item in raw {
            let question = validate(department_id, item)?;
            if !seen.insert(question.question_number) {
                return Err(DomainError::Validation(format!(
                    "duplicate question_number {}",
                    question.question_number
                )));
            }
            questions.push(question);
        }
        questions.sort_by_key(|q| q.question_number);

        Ok(Self {
            questions,
            content_hash: format!("{:x}", Sha256::digest(source.as_bytes())),
        })
    }

    /// Number of questions in the bank.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no questions (never true after `parse`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn validate(department_id: &DepartmentId, raw: RawQuestion) -> Result<Question, DomainError> {
    let number = u32::try_from(raw.question_number)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "question_number must be a positive integer, got {}",
                raw.question_number
            ))
        })?;
    if raw.question_text.trim().is_empty() {
        return Err(DomainError::Validation(format!(
            "question {number} has empty question_text"
        )));
    }
    let options = Options {
        a: raw.options.a,
        b: raw.options.b,
        c: raw.options.c,
        d: raw.options.d,
    };
    if let Some(blank) = Choice::ALL
        .iter()
        .find(|c| options.get(**c).trim().is_empty())
    {
        return Err(DomainError::Validation(format!(
            "question {number} has an empty option {blank}"
        )));
    }
    let answer: Choice = raw.answer.parse().map_err(|_| {
        DomainError::Validation(format!(
            "question {number} has answer {:?}; expected a, b, c or d",
            raw.answer
        ))
    })?;

    Ok(Question {
        department_id: department_id.clone(),
        question_number: number,
        question_text: raw.question_text,
        options,
        answer,
        explanation: raw.explanation,
    })
}
