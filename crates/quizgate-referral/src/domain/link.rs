//! Deep-link start parameters.
//!
//! A referral link carries `ref_<inviterId>_dept_<deptId>` with the
//! department percent-encoded; a department link carries `dept_<deptId>`.
//! Anything that does not decode cleanly is treated as "no parameter".

use std::fmt;

use quizgate_core::ids::{DepartmentId, UserId};
use serde::Serialize;

const REFERRAL_PREFIX: &str = "ref_";
const DEPARTMENT_SEPARATOR: &str = "_dept_";
const DEPARTMENT_PREFIX: &str = "dept_";

/// Who invited, and into which department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralCode {
    /// The user who shared the link.
    pub inviter: UserId,
    /// The department the invite is scoped to; absent on legacy links.
    pub department: Option<DepartmentId>,
}

impl ReferralCode {
    /// Creates a department-scoped referral code.
    #[must_use]
    pub fn new(inviter: UserId, department: DepartmentId) -> Self {
        Self {
            inviter,
            department: Some(department),
        }
    }

    /// Encodes the code as a start parameter.
    #[must_use]
    pub fn encode(&self) -> String {
        match &self.department {
            Some(department) => format!(
                "{REFERRAL_PREFIX}{}{DEPARTMENT_SEPARATOR}{}",
                self.inviter,
                urlencoding::encode(department.as_str())
            ),
            None => format!("{REFERRAL_PREFIX}{}", self.inviter),
        }
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A decoded start parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartParam {
    /// The user arrived through someone's referral link.
    Referral(ReferralCode),
    /// The user arrived through a department announcement link.
    Department(DepartmentId),
    /// No parameter, or one that could not be decoded.
    None,
}

impl StartParam {
    /// Decodes a raw start parameter. Never fails: malformed input yields
    /// `StartParam::None`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::None;
        };
        if let Some(rest) = raw.strip_prefix(REFERRAL_PREFIX) {
            return parse_referral(rest).map_or(Self::None, Self::Referral);
        }
        if let Some(rest) = raw.strip_prefix(DEPARTMENT_PREFIX) {
            return decode_department(rest).map_or(Self::None, Self::Department);
        }
        Self::None
    }
}

fn parse_referral(rest: &str) -> Option<ReferralCode> {
    let (inviter, department) = match rest.split_once(DEPARTMENT_SEPARATOR) {
        Some((inviter, encoded)) => (inviter, Some(decode_department(encoded)?)),
        None => (rest, None),
    };
    if inviter.is_empty() || !inviter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let inviter: UserId = inviter.parse().ok()?;
    Some(ReferralCode {
        inviter,
        department,
    })
}

fn decode_department(encoded: &str) -> Option<DepartmentId> {
    let decoded = urlencoding::decode(encoded).ok()?;
    DepartmentId::new(decoded.as_ref()).ok()
}

/// Builds shareable deep links for the bot.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    bot_username: String,
}

impl LinkBuilder {
    /// Creates a builder for `bot_username` (a leading `@` is ignored).
    #[must_use]
    pub fn new(bot_username: impl Into<String>) -> Self {
        let bot_username = bot_username.into();
        Self {
            bot_username: bot_username.trim_start_matches('@').to_owned(),
        }
    }

    /// Link that credits `code.inviter` when someone starts through it.
    #[must_use]
    pub fn referral_link(&self, code: &ReferralCode) -> String {
        format!("https://t.me/{}?start={}", self.bot_username, code.encode())
    }

    /// Link that opens `department` directly.
    #[must_use]
    pub fn department_link(&self, department: &DepartmentId) -> String {
        format!(
            "https://t.me/{}?start={DEPARTMENT_PREFIX}{}",
            self.bot_username,
            urlencoding::encode(department.as_str())
        )
    }
}
