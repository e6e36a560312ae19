//! Greedy allocator: walks a day's slots in order and fills focus
//! capacity with the best candidate task per slot.
//!
//! The allocator takes exclusive mutable ownership of the task pool and
//! slot list for the duration of one call; its only side effects are
//! draining `available_minutes` on slots and `remaining_min` on tasks.
//! Allocations themselves are append-only output.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::PlanOptions;
use crate::selector::select_best;
use crate::slot::{Slot, SlotId, SlotType};
use crate::task::{PlannerTask, ProjectId, TaskId};

/// Origin of an allocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationSource {
    /// Produced by a planning run.
    Planner,
    /// Created by hand in the UI.
    Manual,
}

/// A task consuming part of one focus slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub task_id: TaskId,
    pub slot_id: SlotId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub minutes: u32,
    pub source: AllocationSource,
}

/// Allocate tasks to the day's slots in chronological order.
///
/// Only focus slots with capacity are considered; meeting, break, and
/// buffer slots never receive allocations. Once the distinct-project
/// count reaches the WIP cap, a slot whose best candidate would open yet
/// another project is skipped outright -- its capacity stays unused
/// rather than falling back to a second-best in-cap candidate. That
/// trade-off is intentional and kept for compatibility.
pub fn allocate(
    tasks: &mut [PlannerTask],
    slots: &mut [Slot],
    options: &PlanOptions,
) -> Vec<Allocation> {
    let mut allocations: Vec<Allocation> = Vec::new();
    let mut last_project: Option<ProjectId> = options.last_project.clone();
    let mut active_projects: HashSet<ProjectId> = HashSet::new();
    let wip_cap = options.settings.wip_projects_max;

    for slot_index in 0..slots.len() {
        if slots[slot_index].slot_type != SlotType::Focus
            || slots[slot_index].available_minutes == 0
        {
            continue;
        }

        let Some(task_index) = select_best(
            &slots[slot_index],
            tasks,
            last_project.as_deref(),
            options.now,
            &options.scoring,
            options.exclusive_category,
        ) else {
            continue;
        };

        let candidate_project = tasks[task_index].project_id.clone();
        if wip_cap > 0 {
            if let Some(project) = &candidate_project {
                if !active_projects.contains(project) && active_projects.len() >= wip_cap {
                    continue;
                }
            }
        }

        let minutes = slots[slot_index]
            .available_minutes
            .min(tasks[task_index].remaining());
        let start = slots[slot_index].start;

        allocations.push(Allocation {
            id: format!(
                "{}-{}-{}",
                slots[slot_index].id,
                tasks[task_index].id,
                allocations.len()
            ),
            task_id: tasks[task_index].id.clone(),
            slot_id: slots[slot_index].id.clone(),
            start,
            end: start + Duration::minutes(i64::from(minutes)),
            minutes,
            source: AllocationSource::Planner,
        });

        slots[slot_index].available_minutes -= minutes;
        tasks[task_index].consume(minutes);
        if let Some(project) = candidate_project {
            active_projects.insert(project.clone());
            last_project = Some(project);
        }
    }

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{UserSettings, WorkingDayPreference};
    use crate::slot::build_slots;
    use crate::task::{Priority, TaskStatus};
    use chrono::{NaiveDate, Weekday};

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn morning_settings() -> UserSettings {
        UserSettings {
            working_days: vec![WorkingDayPreference::new(Weekday::Mon, 9, 12, true)],
            max_continuous_minutes: 600,
            ..UserSettings::default()
        }
    }

    fn options(settings: UserSettings) -> PlanOptions {
        PlanOptions {
            settings,
            ..PlanOptions::default()
        }
    }

    fn ready(id: &str, project: &str, priority: Priority, estimate: u32) -> PlannerTask {
        let mut task = PlannerTask::new(id, format!("Task {id}"))
            .with_project(project)
            .with_priority(priority)
            .with_estimate(estimate)
            .with_status(TaskStatus::Active);
        task.init_remaining();
        task
    }

    #[test]
    fn splits_task_across_slots_until_exhausted() {
        let opts = options(morning_settings());
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        let mut tasks = vec![ready("t-1", "p-1", Priority::P1, 60)];

        let allocations = allocate(&mut tasks, &mut slots, &opts);

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].minutes, 30);
        assert_eq!(allocations[1].minutes, 30);
        assert_eq!(tasks[0].remaining(), 0);

        // The remaining focus slots found no candidate and stay open.
        let untouched = slots
            .iter()
            .filter(|s| s.slot_type == SlotType::Focus && s.available_minutes > 0)
            .count();
        assert_eq!(untouched, 4);
    }

    #[test]
    fn never_allocates_non_focus_slots() {
        let opts = options(morning_settings());
        let busy = vec![crate::slot::BusyInterval::new(
            "m",
            monday().and_hms_opt(10, 0, 0).unwrap().and_utc(),
            monday().and_hms_opt(10, 30, 0).unwrap().and_utc(),
        )];
        let mut slots = build_slots(monday(), &opts.settings, &busy).unwrap();
        let mut tasks = vec![ready("t-1", "p-1", Priority::P1, 600)];

        let allocations = allocate(&mut tasks, &mut slots, &opts);

        let focus_ids: Vec<_> = slots
            .iter()
            .filter(|s| s.slot_type == SlotType::Focus)
            .map(|s| s.id.clone())
            .collect();
        assert!(!allocations.is_empty());
        for allocation in &allocations {
            assert!(
                focus_ids.contains(&allocation.slot_id),
                "allocation {} landed on a non-focus slot",
                allocation.id
            );
        }
    }

    #[test]
    fn wip_cap_limits_distinct_projects_and_wastes_the_slot() {
        let settings = UserSettings {
            wip_projects_max: 2,
            ..morning_settings()
        };
        let opts = options(settings);
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        // Three projects, 60 minutes each: enough slots for all of them,
        // but only two projects may open.
        let mut tasks = vec![
            ready("a", "p-1", Priority::P1, 60),
            ready("b", "p-2", Priority::P2, 60),
            ready("c", "p-3", Priority::P3, 60),
        ];

        let allocations = allocate(&mut tasks, &mut slots, &opts);

        let projects: HashSet<_> = allocations
            .iter()
            .map(|a| {
                tasks
                    .iter()
                    .find(|t| t.id == a.task_id)
                    .and_then(|t| t.project_id.clone())
                    .unwrap()
            })
            .collect();
        assert_eq!(projects.len(), 2);
        assert_eq!(tasks[2].remaining(), 60, "third project never runs");

        // Slots whose best candidate was out-of-cap are left unused, not
        // given to a second-best candidate.
        let unused = slots
            .iter()
            .filter(|s| s.slot_type == SlotType::Focus && s.available_minutes > 0)
            .count();
        assert!(unused > 0);
    }

    #[test]
    fn zero_wip_cap_disables_the_gate() {
        let settings = UserSettings {
            wip_projects_max: 0,
            ..morning_settings()
        };
        let opts = options(settings);
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        let mut tasks = vec![
            ready("a", "p-1", Priority::P1, 30),
            ready("b", "p-2", Priority::P1, 30),
            ready("c", "p-3", Priority::P1, 30),
            ready("d", "p-4", Priority::P1, 30),
        ];

        let allocations = allocate(&mut tasks, &mut slots, &opts);
        assert_eq!(allocations.len(), 4, "all four projects get scheduled");
    }

    #[test]
    fn project_less_tasks_bypass_the_wip_gate() {
        let settings = UserSettings {
            wip_projects_max: 1,
            ..morning_settings()
        };
        let opts = options(settings);
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        let mut no_project = PlannerTask::new("loose", "Ablage sortieren")
            .with_priority(Priority::P4)
            .with_estimate(30)
            .with_status(TaskStatus::Active);
        no_project.init_remaining();
        let mut tasks = vec![ready("a", "p-1", Priority::P1, 30), no_project];

        let allocations = allocate(&mut tasks, &mut slots, &opts);

        assert_eq!(allocations.len(), 2);
        assert_eq!(tasks[1].remaining(), 0);
    }

    #[test]
    fn allocation_ids_derive_from_slot_task_and_sequence() {
        let opts = options(morning_settings());
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        let mut tasks = vec![ready("t-1", "p-1", Priority::P1, 45)];

        let allocations = allocate(&mut tasks, &mut slots, &opts);
        assert_eq!(allocations[0].id, "2025-03-10-slot-0-t-1-0");
        assert_eq!(allocations[1].id, "2025-03-10-slot-1-t-1-1");
        assert_eq!(allocations[1].minutes, 15);
    }

    #[test]
    fn exhausted_task_is_not_selected_again_in_the_same_run() {
        let opts = options(morning_settings());
        let mut slots = build_slots(monday(), &opts.settings, &[]).unwrap();
        let mut tasks = vec![
            ready("short", "p-1", Priority::P1, 30),
            ready("long", "p-1", Priority::P3, 60),
        ];

        let allocations = allocate(&mut tasks, &mut slots, &opts);

        let short_allocations = allocations
            .iter()
            .filter(|a| a.task_id == "short")
            .count();
        assert_eq!(short_allocations, 1);
        assert_eq!(tasks[0].remaining(), 0);
        assert_eq!(tasks[1].remaining(), 0);
    }
}
