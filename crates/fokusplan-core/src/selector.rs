//! Candidate selection: which task, if any, gets a given slot.
//!
//! Selection narrows the pool in stages:
//! 1. feasibility (remaining work, schedulable status, dependency gate),
//! 2. probe-task fallback (bare "test" titles only when nothing else fits),
//! 3. per-assignee exclusivity inside the exclusive project category,
//! 4. highest score wins, first-encountered on ties.
//!
//! Pool order is preserved throughout so tie-breaks stay deterministic.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::scoring::{score_task, ScoreContext, ScoringConfig};
use crate::slot::Slot;
use crate::task::{PlannerTask, RoleCategory};

/// Category whose tasks are limited to one candidate per assignee within
/// a single selection pass.
pub const DEFAULT_EXCLUSIVE_CATEGORY: RoleCategory = RoleCategory::It;

/// Key for the per-assignee exclusivity rule; unassigned tasks all share
/// one slot under the rule.
#[derive(PartialEq, Eq, Hash)]
enum AssigneeKey<'a> {
    User(&'a str),
    Unassigned,
}

/// Pick the best feasible task for one slot.
///
/// Returns the index of the winner within `tasks`, or `None` when no
/// task survives filtering. Does not mutate anything; the allocator
/// applies the consequences.
pub fn select_best(
    slot: &Slot,
    tasks: &[PlannerTask],
    last_project: Option<&str>,
    now: DateTime<Utc>,
    config: &ScoringConfig,
    exclusive_category: Option<RoleCategory>,
) -> Option<usize> {
    // Remaining minutes per task id, for the dependency gate. An id
    // referenced by blocked_by but absent from the pool conservatively
    // counts as still blocking.
    let remaining_by_id: HashMap<&str, u32> = tasks
        .iter()
        .map(|task| (task.id.as_str(), task.remaining()))
        .collect();

    let feasible: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| {
            task.remaining() > 0
                && task.status.is_schedulable()
                && !task.blocked_by.iter().any(|blocker_id| {
                    remaining_by_id
                        .get(blocker_id.as_str())
                        .map(|remaining| *remaining > 0)
                        .unwrap_or(true)
                })
        })
        .map(|(index, _)| index)
        .collect();

    if feasible.is_empty() {
        return None;
    }

    // Probe tasks only compete when no ordinary task is feasible.
    let ordinary: Vec<usize> = feasible
        .iter()
        .copied()
        .filter(|&index| !tasks[index].is_probe())
        .collect();
    let pool = if ordinary.is_empty() { feasible } else { ordinary };

    let ctx = ScoreContext {
        slot,
        last_project,
        now,
    };
    let mut scored: Vec<(usize, f64)> = pool
        .into_iter()
        .map(|index| (index, score_task(&tasks[index], &ctx, config)))
        .collect();

    if let Some(category) = exclusive_category {
        scored = apply_exclusivity(scored, tasks, category);
    }

    // Strictly-greater comparison keeps the first candidate on ties.
    scored
        .into_iter()
        .fold(None::<(usize, f64)>, |best, (index, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
}

/// Keep at most one exclusive-category candidate per assignee, resolving
/// ties in favor of the higher-scoring task.
fn apply_exclusivity(
    scored: Vec<(usize, f64)>,
    tasks: &[PlannerTask],
    category: RoleCategory,
) -> Vec<(usize, f64)> {
    let mut best_per_assignee: HashMap<AssigneeKey<'_>, (usize, f64)> = HashMap::new();

    for &(index, score) in &scored {
        let task = &tasks[index];
        if task.project_category != Some(category) {
            continue;
        }
        let key = match task.assigned_to.as_deref() {
            Some(user) => AssigneeKey::User(user),
            None => AssigneeKey::Unassigned,
        };
        match best_per_assignee.get(&key) {
            Some(&(_, best_score)) if score <= best_score => {}
            _ => {
                best_per_assignee.insert(key, (index, score));
            }
        }
    }

    let kept: Vec<usize> = best_per_assignee
        .values()
        .map(|&(index, _)| index)
        .collect();

    scored
        .into_iter()
        .filter(|&(index, _)| {
            tasks[index].project_category != Some(category) || kept.contains(&index)
        })
        .collect()
}
