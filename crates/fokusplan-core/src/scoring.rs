//! Task-to-slot fit scoring.
//!
//! A pure weighted sum over a handful of explainable terms: priority,
//! value per time, deadline urgency, energy match, plus small continuity
//! adjustments (area focus bonus, hard-deadline bonus, context-switch
//! penalty). No term looks at anything beyond the task, the candidate
//! slot, and the running planning context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slot::{EnergyLevel, Slot};
use crate::task::{PlannerTask, Priority};

/// Flat bonus granted when a task continues the project the planner was
/// last working in.
const AREA_FOCUS_BONUS: f64 = 0.05;

/// Weights for each scoring term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub priority: f64,
    pub value_per_time: f64,
    pub deadline: f64,
    pub area_focus: f64,
    pub energy_match: f64,
    pub hard_deadline: f64,
    pub context_switch: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            priority: 0.30,
            value_per_time: 0.20,
            deadline: 0.25,
            area_focus: 0.05,
            energy_match: 0.10,
            hard_deadline: 0.05,
            context_switch: 0.05,
        }
    }
}

/// Caller-supplied scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
}

/// Context for scoring one task against one slot.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub slot: &'a Slot,
    /// Project that received the previous allocation in this run.
    pub last_project: Option<&'a str>,
    pub now: DateTime<Utc>,
}

/// Base weight of a priority tier; missing priority scores between P3
/// and P4.
pub fn priority_weight(priority: Option<Priority>) -> f64 {
    match priority {
        Some(Priority::P1) => 1.0,
        Some(Priority::P2) => 0.8,
        Some(Priority::P3) => 0.6,
        Some(Priority::P4) => 0.3,
        None => 0.4,
    }
}

/// Reward for short, high-priority tasks, capped at 1 so very short
/// tasks cannot dominate on size alone.
pub fn value_per_time(task: &PlannerTask) -> f64 {
    match task.estimate_min {
        Some(estimate) if estimate > 0 => {
            let score = priority_weight(task.priority) * 60.0 / f64::from(estimate);
            score.min(1.0)
        }
        _ => 0.0,
    }
}

/// Urgency ramps linearly from 0 (due in 7+ days) to 1 (due now or past
/// due). Tasks without a due instant are never urgent.
pub fn deadline_urgency(task: &PlannerTask, now: DateTime<Utc>) -> f64 {
    let Some(due_at) = task.due_at else {
        return 0.0;
    };
    let diff = due_at - now;
    if diff <= chrono::Duration::zero() {
        return 1.0;
    }
    let days = diff.num_seconds() as f64 / 86_400.0;
    (1.0 - days / 7.0).clamp(0.0, 1.0)
}

/// Closeness of the task's energy requirement to the slot's energy tier
/// on the shared 1-3 scale.
pub fn energy_match(task: &PlannerTask, slot_energy: EnergyLevel) -> f64 {
    let diff = f64::from(task.energy_value()) - f64::from(slot_energy.value());
    (1.0 - diff.abs() / 3.0).max(0.0)
}

/// Score one task against one candidate slot.
pub fn score_task(task: &PlannerTask, ctx: &ScoreContext, config: &ScoringConfig) -> f64 {
    let weights = &config.weights;
    let priority = priority_weight(task.priority);
    let per_time = value_per_time(task);
    let deadline = deadline_urgency(task, ctx.now);
    let energy = energy_match(task, ctx.slot.energy);

    let same_project = matches!(
        (ctx.last_project, task.project_id.as_deref()),
        (Some(last), Some(own)) if last == own
    );
    let area_focus = if same_project { AREA_FOCUS_BONUS } else { 0.0 };
    let hard_deadline = if task.hard_deadline {
        weights.hard_deadline
    } else {
        0.0
    };
    let context_penalty = match ctx.last_project {
        Some(last) if task.project_id.as_deref() != Some(last) => weights.context_switch,
        _ => 0.0,
    };

    priority * weights.priority
        + per_time * weights.value_per_time
        + deadline * weights.deadline
        + area_focus * weights.area_focus
        + energy * weights.energy_match
        + hard_deadline
        - context_penalty
}
