#![forbid(unsafe_code)]
//! Rotaplan — weekly 24/7 on-call rotation library (file-backed, no DB).
//!
//! - Hourly coverage units over a Monday-to-Sunday horizon.
//! - Round-robin assignment under daily/weekly hour caps with override tiers.
//! - Post-hoc schedule validation, peer-to-peer slot swaps with deadlines.
//! - All in UTC; the planner takes "now" as a parameter and `&mut self` for
//!   every mutation, so runs are replayable and single-writer by ownership.

pub mod io;
pub mod model;
pub mod notification;
pub mod planner;
pub mod storage;

pub use model::{
    Member, MemberId, Membership, Rota, Schedule, ScheduleConfig, ScheduleId, ScheduleStatus,
    SlotId, SwapId, SwapRequest, SwapStatus, Team, TeamId, Timeslot, ValidationReport,
    WeeklyHoursRecord,
};
pub use notification::{prepare_reminder, Reminder, ReminderRenderer, TextReminder};
pub use planner::{
    required_members, AssignPolicy, BatchOutcome, GenerationOutcome, PlanError, Planner,
    RegeneratedWeek,
};
pub use storage::{JsonStorage, Storage};
