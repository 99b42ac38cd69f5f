//! Query handlers for the Score & Leaderboard context.
//!
//! The leaderboard is computed on demand from a full scan. It is an
//! administrative report, not part of the answer path.

use std::collections::{BTreeMap, HashMap};

use quizgate_core::error::DomainError;
use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::repository::{LeaderboardStore, UserStore};
use serde::Serialize;

use crate::domain::ranking;

/// One row of a leaderboard report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based rank.
    pub rank: usize,
    /// The ranked user.
    pub user_id: UserId,
    /// Name to display.
    pub display_name: String,
    /// Accuracy as a percentage.
    pub accuracy_percent: f64,
    /// Attempts counted for this row.
    pub attempts: u64,
}

/// Read-only leaderboard report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeaderboardView {
    /// Top users by mean per-department accuracy.
    pub overall: Vec<LeaderboardRow>,
    /// Top users per department by accuracy.
    pub per_department: BTreeMap<DepartmentId, Vec<LeaderboardRow>>,
}

async fn resolve_names(
    ids: impl IntoIterator<Item = UserId>,
    users: &dyn UserStore,
) -> Result<HashMap<UserId, String>, DomainError> {
    let mut names = HashMap::new();
    for id in ids {
        if names.contains_key(&id) {
            continue;
        }
        let name = users
            .get(id)
            .await?
            .map_or_else(|| id.to_string(), |user| user.display_name());
        names.insert(id, name);
    }
    Ok(names)
}

/// Computes the leaderboard report.
///
/// # Errors
///
/// Returns the store's error if the scan or a name lookup fails.
pub async fn get_leaderboard(
    leaderboard: &dyn LeaderboardStore,
    users: &dyn UserStore,
) -> Result<LeaderboardView, DomainError> {
    let entries = leaderboard.scan_all().await?;
    let standings = ranking::rank(&entries);

    let ranked_ids = standings
        .overall
        .iter()
        .map(|s| s.user_id)
        .chain(standings.per_department.values().flatten().map(|s| s.user_id));
    let names = resolve_names(ranked_ids.collect::<Vec<_>>(), users).await?;
    let name_of = |id: UserId| names.get(&id).cloned().unwrap_or_else(|| id.to_string());

    let overall = standings
        .overall
        .iter()
        .enumerate()
        .map(|(i, s)| LeaderboardRow {
            rank: i + 1,
            user_id: s.user_id,
            display_name: name_of(s.user_id),
            accuracy_percent: s.mean_accuracy * 100.0,
            attempts: s.total_attempts,
        })
        .collect();
    let per_department = standings
        .per_department
        .iter()
        .map(|(department, rows)| {
            let rows = rows
                .iter()
                .enumerate()
                .map(|(i, s)| LeaderboardRow {
                    rank: i + 1,
                    user_id: s.user_id,
                    display_name: name_of(s.user_id),
                    accuracy_percent: s.accuracy * 100.0,
                    attempts: s.attempts,
                })
                .collect();
            (department.clone(), rows)
        })
        .collect();

    Ok(LeaderboardView {
        overall,
        per_department,
    })
}
