//! Leaderboard ranking.
//!
//! Overall rank is the mean of a user's per-department accuracies (each
//! department with at least one attempt counts once, regardless of volume).
//! Department rank is plain accuracy. Ties go to more attempts, then to the
//! lower user id.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use quizgate_core::ids::{DepartmentId, UserId};
use quizgate_core::model::LeaderboardEntry;
use serde::Serialize;

/// Users listed in the overall ranking.
pub const TOP_OVERALL: usize = 10;

/// Users listed per department.
pub const TOP_PER_DEPARTMENT: usize = 3;

/// A user's place in the overall ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStanding {
    /// The ranked user.
    pub user_id: UserId,
    /// Mean per-department accuracy in `[0, 1]`.
    pub mean_accuracy: f64,
    /// Attempts across all departments.
    pub total_attempts: u64,
}

/// A user's place in one department's ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentStanding {
    /// The ranked user.
    pub user_id: UserId,
    /// Accuracy in `[0, 1]`.
    pub accuracy: f64,
    /// Attempts in the department.
    pub attempts: u64,
}

/// Both rankings, already truncated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Standings {
    /// Top users overall.
    pub overall: Vec<OverallStanding>,
    /// Top users per department.
    pub per_department: BTreeMap<DepartmentId, Vec<DepartmentStanding>>,
}

fn by_score(a: (f64, u64, UserId), b: (f64, u64, UserId)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.2.cmp(&b.2))
}

/// Ranks every entry.
#[must_use]
pub fn rank(entries: &[LeaderboardEntry]) -> Standings {
    let mut overall = Vec::new();
    let mut per_department: BTreeMap<DepartmentId, Vec<DepartmentStanding>> = BTreeMap::new();

    for entry in entries {
        let mut accuracies = Vec::new();
        let mut total_attempts = 0;
        for (department, tally) in &entry.departments {
            let Some(accuracy) = tally.accuracy() else {
                continue;
            };
            accuracies.push(accuracy);
            total_attempts += tally.attempts;
            per_department
                .entry(department.clone())
                .or_default()
                .push(DepartmentStanding {
                    user_id: entry.user_id,
                    accuracy,
                    attempts: tally.attempts,
                });
        }
        if accuracies.is_empty() {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean_accuracy = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
        overall.push(OverallStanding {
            user_id: entry.user_id,
            mean_accuracy,
            total_attempts,
        });
    }

    overall.sort_by(|a, b| {
        by_score(
            (a.mean_accuracy, a.total_attempts, a.user_id),
            (b.mean_accuracy, b.total_attempts, b.user_id),
        )
    });
    overall.truncate(TOP_OVERALL);

    for standings in per_department.values_mut() {
        standings.sort_by(|a, b| {
            by_score(
                (a.accuracy, a.attempts, a.user_id),
                (b.accuracy, b.attempts, b.user_id),
            )
        });
        standings.truncate(TOP_PER_DEPARTMENT);
    }

    Standings {
        overall,
        per_department,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use quizgate_core::ids::{DepartmentId, UserId};
    use quizgate_core::model::{DepartmentTally, LeaderboardEntry};

    use super::*;

    fn entry(user: i64, tallies: &[(&str, u64, u64)]) -> LeaderboardEntry {
        LeaderboardEntry {
            user_id: UserId::new(user).unwrap(),
            departments: tallies
                .iter()
                .map(|(name, attempts, correct)| {
                    (
                        DepartmentId::new(name).unwrap(),
                        DepartmentTally {
                            attempts: *attempts,
                            correct: *correct,
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_uses_mean_of_department_accuracies() {
        // User 1: 100% in one department, 0% in another -> 0.5 mean.
        // User 2: 60% in a single department with many attempts.
        let entries = vec![
            entry(1, &[("Math", 1, 1), ("Art", 9, 0)]),
            entry(2, &[("Math", 10, 6)]),
        ];

        let standings = rank(&entries);

        assert_eq!(standings.overall[0].user_id.get(), 2);
        assert!((standings.overall[0].mean_accuracy - 0.6).abs() < 1e-9);
        assert_eq!(standings.overall[1].user_id.get(), 1);
        assert!((standings.overall[1].mean_accuracy - 0.5).abs() < 1e-9);
        assert_eq!(standings.overall[1].total_attempts, 10);
    }

    #[test]
    fn test_rank_truncates_to_top_lists() {
        let entries: Vec<LeaderboardEntry> = (1..=15)
            .map(|u| entry(u, &[("Math", 20, u64::try_from(u).unwrap())]))
            .collect();

        let standings = rank(&entries);

        assert_eq!(standings.overall.len(), TOP_OVERALL);
        assert_eq!(standings.overall[0].user_id.get(), 15);
        let math = &standings.per_department[&DepartmentId::new("Math").unwrap()];
        assert_eq!(math.len(), TOP_PER_DEPARTMENT);
        let ids: Vec<i64> = math.iter().map(|s| s.user_id.get()).collect();
        assert_eq!(ids, vec![15, 14, 13]);
    }

    #[test]
    fn test_rank_breaks_ties_by_attempts_then_user_id() {
        let entries = vec![
            entry(3, &[("Math", 2, 1)]),
            entry(1, &[("Math", 2, 1)]),
            entry(2, &[("Math", 4, 2)]),
        ];

        let standings = rank(&entries);

        let ids: Vec<i64> = standings.overall.iter().map(|s| s.user_id.get()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_rank_skips_departments_without_attempts() {
        let entries = vec![entry(1, &[("Math", 0, 0)])];

        let standings = rank(&entries);

        assert!(standings.overall.is_empty());
        assert!(standings.per_department.is_empty());
    }
}
