use crate::model::{ScheduleId, ValidationReport};
use chrono::NaiveDate;
use thiserror::Error;

/// Hard per-day ceiling; never relaxed by any override tier.
pub const MAX_DAILY_HOURS: f64 = 8.0;
/// Base weekly target; a soft fairness cap relaxed by override tiers.
pub const MAX_WEEKLY_HOURS: f64 = 40.0;
/// Extra hours a weekend slot may add on top of the base weekly limit.
pub const WEEKEND_OVERAGE_HOURS: f64 = 8.0;
/// Absolute weekly overage ceiling; no allocation past base + this.
pub const EMERGENCY_OVERAGE_HOURS: f64 = 12.0;
/// Hours in the fixed weekly horizon.
pub const HOURS_PER_WEEK: u32 = 168;
/// Notice window a swap must leave before the earlier slot starts.
pub const SWAP_NOTICE_HOURS: i64 = 24;

/// Minimum active headcount for 24/7 coverage with nobody over the
/// weekly cap: ceil(168 / 40).
pub fn required_members() -> usize {
    ((HOURS_PER_WEEK as f64) / MAX_WEEKLY_HOURS).ceil() as usize
}

/// Assignment policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignPolicy {
    /// Force-assign the first member when nobody qualifies for a slot.
    /// Off by default: an uncoverable slot is left unassigned and surfaced
    /// by the validator instead of silently breaking the daily cap.
    pub force_cover: bool,
}

/// Which weekly-limit tier allowed an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    WithinLimit,
    WeekendOverride,
    EmergencyOverride,
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("insufficient members: need {required}, have {actual}")]
    InsufficientMembers { required: usize, actual: usize },
    #[error("invalid state: {0}")]
    State(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result of a single-week generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub schedule_id: ScheduleId,
    pub validation: ValidationReport,
}

/// Per-week summary returned by regeneration.
#[derive(Debug, Clone)]
pub struct RegeneratedWeek {
    pub schedule_id: ScheduleId,
    pub week_start: NaiveDate,
    pub slot_count: usize,
    pub assigned_count: usize,
    pub validation: ValidationReport,
}

/// Per-team outcome of a batch generation sweep.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub generated: Vec<(String, GenerationOutcome)>,
    pub skipped: Vec<(String, String)>,
}
