//! Day planner and range replanner.
//!
//! `plan_day` composes the slot builder and the allocator for one
//! calendar date; `replan_range` drives it across a contiguous date
//! range, carrying every task's remaining minutes forward so partially
//! scheduled work keeps shrinking until exhausted.
//!
//! Both are synchronous, single-threaded folds: later days depend on
//! the residual minutes left by earlier days, so days are never planned
//! in parallel.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::allocator::{allocate, Allocation};
use crate::error::{PlanError, Result};
use crate::scoring::ScoringConfig;
use crate::selector::DEFAULT_EXCLUSIVE_CATEGORY;
use crate::settings::UserSettings;
use crate::slot::{build_slots, BusyInterval, Slot, SlotType};
use crate::task::{PlannerTask, ProjectId, RoleCategory, TaskId};

/// Caller-supplied context for a planning run.
///
/// Everything the engine needs is passed in here explicitly; there is
/// no process-wide mutable configuration.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub settings: UserSettings,
    pub scoring: ScoringConfig,
    /// Project category subject to the per-assignee exclusivity rule;
    /// `None` disables the rule.
    pub exclusive_category: Option<RoleCategory>,
    /// Project that received the most recent allocation before this run,
    /// seeding the context-switch terms.
    pub last_project: Option<ProjectId>,
    /// Reference instant for deadline urgency.
    pub now: DateTime<Utc>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            scoring: ScoringConfig::default(),
            exclusive_category: Some(DEFAULT_EXCLUSIVE_CATEGORY),
            last_project: None,
            now: Utc::now(),
        }
    }
}

/// Outcome of planning a single date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub allocations: Vec<Allocation>,
    /// The task pool with updated remaining minutes; callers persist
    /// this so later runs resume where this one left off.
    pub tasks: Vec<PlannerTask>,
}

impl PlanResult {
    /// Minutes of focus time this plan scheduled.
    pub fn planned_focus_minutes(&self) -> u32 {
        self.allocations.iter().map(|a| a.minutes).sum()
    }

    /// Focus slots that still have unscheduled capacity.
    pub fn open_focus_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.slot_type == SlotType::Focus && s.available_minutes > 0)
            .count()
    }
}

/// One entry of a range replan. A failed day degrades to an empty plan
/// and carries the error message instead of aborting the whole range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    pub allocations: Vec<Allocation>,
    pub tasks: Vec<PlannerTask>,
    pub error: Option<String>,
}

impl From<PlanResult> for DayPlan {
    fn from(result: PlanResult) -> Self {
        Self {
            date: result.date,
            slots: result.slots,
            allocations: result.allocations,
            tasks: result.tasks,
            error: None,
        }
    }
}

impl DayPlan {
    fn empty(date: NaiveDate, tasks: Vec<PlannerTask>, error: Option<String>) -> Self {
        Self {
            date,
            slots: Vec::new(),
            allocations: Vec::new(),
            tasks,
            error,
        }
    }
}

/// Plan one calendar date.
///
/// Initializes each task's remaining minutes from its estimate where
/// not already set, builds the day's slots, and runs the allocator. A
/// non-working day returns an empty plan with the task pool untouched.
pub fn plan_day(
    date: NaiveDate,
    mut tasks: Vec<PlannerTask>,
    busy: &[BusyInterval],
    options: &PlanOptions,
) -> Result<PlanResult> {
    for task in &mut tasks {
        task.init_remaining();
    }

    let mut slots = build_slots(date, &options.settings, busy)?;
    let allocations = if slots.is_empty() {
        Vec::new()
    } else {
        allocate(&mut tasks, &mut slots, options)
    };

    Ok(PlanResult {
        date,
        slots,
        allocations,
        tasks,
    })
}

/// Replan a contiguous date range, carrying residual task state forward
/// day by day.
///
/// Disabled weekdays and days strictly before `today` short-circuit to
/// an empty plan without running the allocator; a day that fails
/// outright is reported in its `DayPlan` and later days still run with
/// the residual state preserved.
pub fn replan_range(
    start: NaiveDate,
    end: NaiveDate,
    tasks: Vec<PlannerTask>,
    busy_by_day: &HashMap<NaiveDate, Vec<BusyInterval>>,
    today: NaiveDate,
    options: &PlanOptions,
) -> Result<Vec<DayPlan>> {
    if end < start {
        return Err(PlanError::InvalidRange { start, end });
    }

    let mut remaining: HashMap<TaskId, u32> = tasks
        .iter()
        .map(|task| (task.id.clone(), task.remaining()))
        .collect();
    let mut plans = Vec::new();
    let mut current = start;

    loop {
        let day_tasks = materialize(&tasks, &remaining);
        let is_working_day = options.settings.resolve_working_day(current).is_some();

        if !is_working_day || current < today {
            plans.push(DayPlan::empty(current, day_tasks, None));
        } else {
            let busy = busy_by_day
                .get(&current)
                .map(Vec::as_slice)
                .unwrap_or_default();
            match plan_day(current, day_tasks, busy, options) {
                Ok(result) => {
                    for task in &result.tasks {
                        remaining.insert(task.id.clone(), task.remaining());
                    }
                    plans.push(DayPlan::from(result));
                }
                Err(err) => {
                    plans.push(DayPlan::empty(
                        current,
                        materialize(&tasks, &remaining),
                        Some(err.to_string()),
                    ));
                }
            }
        }

        if current >= end {
            break;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    Ok(plans)
}

/// Snapshot the pool with each task's carried-forward remaining minutes.
fn materialize(tasks: &[PlannerTask], remaining: &HashMap<TaskId, u32>) -> Vec<PlannerTask> {
    tasks
        .iter()
        .map(|task| {
            let mut snapshot = task.clone();
            let minutes = remaining
                .get(&snapshot.id)
                .copied()
                .unwrap_or_else(|| snapshot.remaining());
            snapshot.remaining_min = Some(minutes);
            snapshot
        })
        .collect()
}
