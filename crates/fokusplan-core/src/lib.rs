//! # Fokusplan Core Library
//!
//! This library provides the planner engine for Fokusplan: it turns a
//! pool of pending tasks plus a user's working-hour and energy
//! preferences into a concrete, time-boxed daily or weekly schedule,
//! respecting dependencies, deadlines, context-switch cost, and
//! capacity limits.
//!
//! The engine is a library, not a service. Persistence, calendar
//! ingestion, and rendering are external collaborators: they materialize
//! the task pool, busy intervals, and preferences before a call, and
//! persist the allocations and residual task state afterwards.
//!
//! ## Architecture
//!
//! - **Slot Builder**: expands a date's working window into energy-tagged
//!   focus/meeting/break/buffer slots
//! - **Scorer**: pure weighted rating of one task against one slot
//! - **Candidate Selector**: feasibility filtering plus probe-task and
//!   exclusivity rules
//! - **Allocator**: greedy chronological fill with a WIP project cap
//! - **Day Planner / Range Replanner**: orchestration across one date or
//!   a contiguous range, carrying residual minutes forward
//!
//! The allocation policy is an intentionally greedy, explainable
//! heuristic, not a solver.

pub mod allocator;
pub mod error;
pub mod plan;
pub mod scoring;
pub mod selector;
pub mod settings;
pub mod slot;
pub mod task;

pub use allocator::{allocate, Allocation, AllocationSource};
pub use error::{PlanError, SettingsError};
pub use plan::{plan_day, replan_range, DayPlan, PlanOptions, PlanResult};
pub use scoring::{score_task, ScoreContext, ScoringConfig, ScoringWeights};
pub use selector::{select_best, DEFAULT_EXCLUSIVE_CATEGORY};
pub use settings::{
    merge_working_days, EnergyWindowRange, EnergyWindows, UserSettings, WorkingDayPreference,
    WorkingPreferences,
};
pub use slot::{build_slots, BusyInterval, EnergyLevel, Slot, SlotId, SlotType};
pub use task::{PlannerTask, Priority, ProjectId, RoleCategory, TaskId, TaskStatus, UserId};
