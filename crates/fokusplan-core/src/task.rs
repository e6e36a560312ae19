//! Task pool model for the planner.
//!
//! Tasks enter a planning run as snapshots of persisted records; the only
//! field the engine mutates is `remaining_min`, which shrinks as
//! allocations are emitted. Everything else is read-only input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a task.
pub type TaskId = String;

/// Unique identifier for a project.
pub type ProjectId = String;

/// Unique identifier for a user.
pub type UserId = String;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Inbox,
    Active,
    Scheduled,
    Done,
    Blocked,
    Deferred,
}

impl TaskStatus {
    /// Whether a task in this status may still receive allocations.
    ///
    /// Done, Blocked, and Deferred remove a task from candidacy
    /// regardless of its remaining minutes.
    pub fn is_schedulable(&self) -> bool {
        match self {
            TaskStatus::Inbox | TaskStatus::Active | TaskStatus::Scheduled => true,
            TaskStatus::Done | TaskStatus::Blocked | TaskStatus::Deferred => false,
        }
    }
}

/// Ordinal priority tier, P1 highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

/// Project role category used for access scoping and the per-assignee
/// exclusivity rule in candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCategory {
    Marketing,
    Hr,
    It,
    Development,
    Vertrieb,
}

/// Titles that mark a task as a probe task (case-insensitive, trimmed).
const PROBE_TITLES: [&str; 3] = ["test", "testen", "testing"];

/// A task as seen by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerTask {
    pub id: TaskId,
    pub title: String,
    pub project_id: Option<ProjectId>,
    /// Category of the owning project, when it has one.
    pub project_category: Option<RoleCategory>,
    pub assigned_to: Option<UserId>,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    /// Estimated total duration in minutes.
    pub estimate_min: Option<u32>,
    /// Energy requirement on a 1-3 ordinal scale (3 = most demanding).
    pub energy: Option<u8>,
    pub due_at: Option<DateTime<Utc>>,
    /// Earliest instant the task should start.
    pub due_start: Option<DateTime<Utc>>,
    pub hard_deadline: bool,
    /// Ids of tasks that must be fully scheduled before this one.
    pub blocked_by: Vec<TaskId>,
    /// Minutes not yet scheduled. `None` until a planning run
    /// initializes it from the estimate.
    pub remaining_min: Option<u32>,
}

impl PlannerTask {
    /// Create a task with the given id and title; everything else defaults
    /// to an unscheduled, unconstrained Inbox task.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            project_id: None,
            project_category: None,
            assigned_to: None,
            status: TaskStatus::Inbox,
            priority: None,
            estimate_min: None,
            energy: None,
            due_at: None,
            due_start: None,
            hard_deadline: false,
            blocked_by: Vec::new(),
            remaining_min: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimate_min = Some(minutes);
        self
    }

    pub fn with_energy(mut self, energy: u8) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_blocked_by(mut self, ids: Vec<TaskId>) -> Self {
        self.blocked_by = ids;
        self
    }

    /// Minutes still to schedule. Falls back to the estimate before the
    /// first planning run has initialized `remaining_min`.
    pub fn remaining(&self) -> u32 {
        self.remaining_min.or(self.estimate_min).unwrap_or(0)
    }

    /// Initialize `remaining_min` from the estimate if not already set.
    pub fn init_remaining(&mut self) {
        if self.remaining_min.is_none() {
            self.remaining_min = Some(self.estimate_min.unwrap_or(0));
        }
    }

    /// Consume minutes from the remaining counter, saturating at zero.
    pub fn consume(&mut self, minutes: u32) {
        self.remaining_min = Some(self.remaining().saturating_sub(minutes));
    }

    /// Task energy requirement, defaulting to the middle of the scale.
    pub fn energy_value(&self) -> u8 {
        self.energy.unwrap_or(2)
    }

    /// Whether this is a probe task: a bare "test"/"testen"/"testing"
    /// title. Probe tasks are only scheduled when no ordinary task is
    /// feasible, so throwaway entries never starve real work.
    pub fn is_probe(&self) -> bool {
        let title = self.title.trim().to_lowercase();
        PROBE_TITLES.iter().any(|probe| title == *probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_detection_is_trimmed_and_case_insensitive() {
        assert!(PlannerTask::new("1", "test").is_probe());
        assert!(PlannerTask::new("2", "  Testen ").is_probe());
        assert!(PlannerTask::new("3", "TESTING").is_probe());
        assert!(!PlannerTask::new("4", "test deployment").is_probe());
        assert!(!PlannerTask::new("5", "Write tests").is_probe());
    }

    #[test]
    fn remaining_falls_back_to_estimate() {
        let mut task = PlannerTask::new("1", "Write report").with_estimate(90);
        assert_eq!(task.remaining(), 90);

        task.init_remaining();
        assert_eq!(task.remaining_min, Some(90));

        task.consume(60);
        assert_eq!(task.remaining(), 30);
        task.consume(60);
        assert_eq!(task.remaining(), 0, "consume saturates at zero");
    }

    #[test]
    fn status_schedulability_is_exhaustive() {
        assert!(TaskStatus::Inbox.is_schedulable());
        assert!(TaskStatus::Active.is_schedulable());
        assert!(TaskStatus::Scheduled.is_schedulable());
        assert!(!TaskStatus::Done.is_schedulable());
        assert!(!TaskStatus::Blocked.is_schedulable());
        assert!(!TaskStatus::Deferred.is_schedulable());
    }

    #[test]
    fn task_serialization_round_trip() {
        let task = PlannerTask::new("t-1", "Quartalsbericht")
            .with_project("p-1")
            .with_priority(Priority::P2)
            .with_estimate(120)
            .with_energy(3);

        let json = serde_json::to_string(&task).unwrap();
        let decoded: PlannerTask = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, "t-1");
        assert_eq!(decoded.priority, Some(Priority::P2));
    }
}
