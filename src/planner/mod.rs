mod assign;
mod ledger;
mod slots;
mod swap;
mod types;
mod validate;

pub use types::{
    required_members, AssignPolicy, Allowance, BatchOutcome, GenerationOutcome, PlanError,
    RegeneratedWeek, EMERGENCY_OVERAGE_HOURS, HOURS_PER_WEEK, MAX_DAILY_HOURS, MAX_WEEKLY_HOURS,
    SWAP_NOTICE_HOURS, WEEKEND_OVERAGE_HOURS,
};

use crate::model::{
    MemberId, Rota, Schedule, ScheduleId, ScheduleStatus, SlotId, SwapId, SwapRequest, TeamId,
    ValidationReport, WeeklyHoursRecord,
};
use chrono::{DateTime, NaiveDate, Utc};
use ledger::Ledger;
use std::collections::HashSet;

/// Planner: drives generation, validation and swaps over an owned [`Rota`].
///
/// Every mutating operation takes `&mut self`; exclusive access is the
/// concurrency contract. Generation builds slots and hour totals locally and
/// commits them to the dataset only once the whole pipeline has succeeded.
#[derive(Debug, Default)]
pub struct Planner {
    rota: Rota,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            rota: Rota::default(),
        }
    }

    pub fn from_rota(rota: Rota) -> Self {
        Self { rota }
    }

    pub fn rota(&self) -> &Rota {
        &self.rota
    }
    pub fn rota_mut(&mut self) -> &mut Rota {
        &mut self.rota
    }
    pub fn into_rota(self) -> Rota {
        self.rota
    }

    /// Generates, assigns and validates the schedule of one team for one
    /// week. Fails without side effects when the week start is not a Monday,
    /// the team is unknown or inactive, a schedule already exists for the
    /// week, or the active headcount is below the required minimum.
    pub fn generate_for_team_week(
        &mut self,
        team_id: &TeamId,
        week_start: NaiveDate,
        publish: bool,
        policy: AssignPolicy,
    ) -> Result<GenerationOutcome, PlanError> {
        slots::ensure_monday(week_start)?;

        let team = self
            .rota
            .find_team(team_id)
            .ok_or_else(|| PlanError::not_found("team", team_id.as_str()))?;
        if !team.active {
            return Err(PlanError::State(format!("team {} is inactive", team.name)));
        }
        if self.rota.find_schedule_for_week(team_id, week_start).is_some() {
            let name = team.name.clone();
            return Err(PlanError::Conflict(format!(
                "schedule already exists for team {name} week {week_start}"
            )));
        }

        let members = team.active_members();
        let required = required_members();
        if members.len() < required {
            return Err(PlanError::InsufficientMembers {
                required,
                actual: members.len(),
            });
        }

        let mut week_slots = slots::generate_week_slots(week_start)?;
        let mut ledger = Ledger::new(team_id.clone(), week_start);
        ledger.seed_from(&self.rota);
        assign::assign_rotation(&self.rota, &members, &mut week_slots, &mut ledger, policy);

        let status = if publish {
            ScheduleStatus::Published
        } else {
            ScheduleStatus::Draft
        };
        let mut schedule =
            Schedule::new(team_id.clone(), week_start, status).map_err(PlanError::Invalid)?;
        schedule.slots = week_slots;
        let schedule_id = schedule.id.clone();

        // Commit point: nothing above touched the dataset.
        self.rota.schedules.push(schedule);
        ledger.merge_into(&mut self.rota);

        let validation = self.validate(&schedule_id)?;
        Ok(GenerationOutcome {
            schedule_id,
            validation,
        })
    }

    /// Regenerates every schedule of the team with `week_start >= from_date`
    /// in place: same schedule id and status, fresh slots and hour records.
    /// Call this after membership changes; the mutation itself is the
    /// caller's event, not the planner's.
    pub fn regenerate_from_date(
        &mut self,
        team_id: &TeamId,
        from_date: NaiveDate,
        policy: AssignPolicy,
    ) -> Result<Vec<RegeneratedWeek>, PlanError> {
        let team = self
            .rota
            .find_team(team_id)
            .ok_or_else(|| PlanError::not_found("team", team_id.as_str()))?;
        let members = team.active_members();

        let mut targets: Vec<(ScheduleId, NaiveDate)> = self
            .rota
            .schedules
            .iter()
            .filter(|s| &s.team == team_id && s.week_start >= from_date)
            .map(|s| (s.id.clone(), s.week_start))
            .collect();
        targets.sort_by_key(|(_, week)| *week);

        let mut updated = Vec::with_capacity(targets.len());
        for (schedule_id, week_start) in targets {
            self.rota
                .weekly_hours
                .retain(|r| !(&r.team == team_id && r.week_start == week_start));
            if let Some(schedule) = self.rota.find_schedule_mut(&schedule_id) {
                // Old slots go first so the daily tallies cannot see them.
                schedule.slots = Vec::new();
                schedule.validation = None;
            }

            let mut week_slots = slots::generate_week_slots(week_start)?;
            let mut ledger = Ledger::new(team_id.clone(), week_start);
            ledger.seed_from(&self.rota);
            assign::assign_rotation(&self.rota, &members, &mut week_slots, &mut ledger, policy);

            let slot_count = week_slots.len();
            let assigned_count = week_slots.iter().filter(|s| s.assigned.is_some()).count();
            if let Some(schedule) = self.rota.find_schedule_mut(&schedule_id) {
                schedule.slots = week_slots;
            }
            ledger.merge_into(&mut self.rota);

            let validation = self.validate(&schedule_id)?;
            updated.push(RegeneratedWeek {
                schedule_id,
                week_start,
                slot_count,
                assigned_count,
                validation,
            });
        }
        Ok(updated)
    }

    /// Recomputes and stores the validation report for a schedule,
    /// overwriting any prior report.
    pub fn validate(&mut self, schedule_id: &ScheduleId) -> Result<ValidationReport, PlanError> {
        let schedule = self
            .rota
            .find_schedule(schedule_id)
            .ok_or_else(|| PlanError::not_found("schedule", schedule_id.as_str()))?;
        let report = validate::validate_schedule(&self.rota, schedule)?;
        if let Some(schedule) = self.rota.find_schedule_mut(schedule_id) {
            schedule.validation = Some(report.clone());
        }
        Ok(report)
    }

    /// Publishes a draft schedule; any other status is a state error.
    pub fn publish(&mut self, schedule_id: &ScheduleId) -> Result<(), PlanError> {
        let schedule = self
            .rota
            .find_schedule_mut(schedule_id)
            .ok_or_else(|| PlanError::not_found("schedule", schedule_id.as_str()))?;
        if schedule.status != ScheduleStatus::Draft {
            return Err(PlanError::State(format!(
                "schedule is not a draft (status: {:?})",
                schedule.status
            )));
        }
        schedule.status = ScheduleStatus::Published;
        Ok(())
    }

    /// Attempts generation for every active team, collecting per-team
    /// outcomes instead of aborting the batch on the first failure.
    pub fn generate_for_all_teams(
        &mut self,
        week_start: NaiveDate,
        publish: bool,
        policy: AssignPolicy,
    ) -> Result<BatchOutcome, PlanError> {
        slots::ensure_monday(week_start)?;
        let teams: Vec<(TeamId, String)> = self
            .rota
            .teams
            .iter()
            .filter(|t| t.active)
            .map(|t| (t.id.clone(), t.name.clone()))
            .collect();

        let mut generated = Vec::new();
        let mut skipped = Vec::new();
        for (team_id, name) in teams {
            match self.generate_for_team_week(&team_id, week_start, publish, policy) {
                Ok(outcome) => generated.push((name, outcome)),
                Err(err) => skipped.push((name, err.to_string())),
            }
        }
        Ok(BatchOutcome { generated, skipped })
    }

    /// Publishes every draft schedule of the given week whose stored
    /// validation is clean. Returns the published ids.
    pub fn publish_valid(&mut self, week_start: NaiveDate) -> Vec<ScheduleId> {
        let mut published = Vec::new();
        for schedule in &mut self.rota.schedules {
            if schedule.week_start == week_start
                && schedule.status == ScheduleStatus::Draft
                && schedule
                    .validation
                    .as_ref()
                    .map(|v| v.is_valid)
                    .unwrap_or(false)
            {
                schedule.status = ScheduleStatus::Published;
                published.push(schedule.id.clone());
            }
        }
        published
    }

    /// Maintenance sweep removing slots whose (start, end) range duplicates
    /// an earlier slot in the same schedule. Returns the number removed.
    pub fn cleanup_duplicate_slots(&mut self, team: Option<&TeamId>) -> usize {
        let mut removed = 0;
        for schedule in &mut self.rota.schedules {
            if let Some(team) = team {
                if &schedule.team != team {
                    continue;
                }
            }
            let mut seen = HashSet::new();
            let before = schedule.slots.len();
            schedule.slots.retain(|s| seen.insert((s.start, s.end)));
            removed += before - schedule.slots.len();
        }
        removed
    }

    pub fn create_swap(
        &mut self,
        requester: &MemberId,
        requester_slot: &SlotId,
        responder_slot: &SlotId,
        now: DateTime<Utc>,
    ) -> Result<SwapRequest, PlanError> {
        swap::create_swap(self, requester, requester_slot, responder_slot, now)
    }

    pub fn accept_swap(
        &mut self,
        id: &SwapId,
        responder: &MemberId,
        now: DateTime<Utc>,
    ) -> Result<SwapRequest, PlanError> {
        swap::accept_swap(self, id, responder, now)
    }

    pub fn reject_swap(
        &mut self,
        id: &SwapId,
        responder: &MemberId,
        reason: &str,
    ) -> Result<SwapRequest, PlanError> {
        swap::reject_swap(self, id, responder, reason)
    }

    pub fn expire_swaps(&mut self, now: DateTime<Utc>) -> Vec<SwapId> {
        swap::expire_overdue(self, now)
    }

    pub fn weekly_hours(
        &self,
        member: &MemberId,
        team: &TeamId,
        week_start: NaiveDate,
    ) -> Option<&WeeklyHoursRecord> {
        self.rota.find_weekly_record(member, team, week_start)
    }
}
