use super::types::{
    Allowance, EMERGENCY_OVERAGE_HOURS, MAX_DAILY_HOURS, WEEKEND_OVERAGE_HOURS,
};
use crate::model::{MemberId, Rota, TeamId, WeeklyHoursRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Working set of weekly hour records for one generation run.
///
/// Existing records are copied in and defaults created lazily; the run
/// mutates only this local set and merges it back into the dataset once the
/// whole pipeline has succeeded, so a failed run leaves no partial totals.
#[derive(Debug)]
pub(super) struct Ledger {
    team: TeamId,
    week_start: NaiveDate,
    records: BTreeMap<MemberId, WeeklyHoursRecord>,
}

impl Ledger {
    pub(super) fn new(team: TeamId, week_start: NaiveDate) -> Self {
        Self {
            team,
            week_start,
            records: BTreeMap::new(),
        }
    }

    /// Seeds the working set from records already persisted for this
    /// team-week.
    pub(super) fn seed_from(&mut self, rota: &Rota) {
        for record in &rota.weekly_hours {
            if record.team == self.team && record.week_start == self.week_start {
                self.records.insert(record.member.clone(), record.clone());
            }
        }
    }

    /// Returns the record for a member, creating a fresh one on first touch.
    pub(super) fn get_or_init(&mut self, member: &MemberId) -> &mut WeeklyHoursRecord {
        self.records.entry(member.clone()).or_insert_with(|| {
            WeeklyHoursRecord::new(member.clone(), self.team.clone(), self.week_start)
        })
    }

    /// Decides whether a member may take `hours` more, and under which tier.
    ///
    /// The daily cap is checked first and is never overridden; the weekly
    /// tiers then apply in order of preference. `EmergencyOverride` is the
    /// hard ceiling: nothing is allowed past base + 12h.
    pub(super) fn can_take(
        &mut self,
        member: &MemberId,
        hours: f64,
        is_weekend: bool,
        daily_hours_so_far: f64,
    ) -> Option<Allowance> {
        if daily_hours_so_far + hours > MAX_DAILY_HOURS {
            return None;
        }

        let record = self.get_or_init(member);
        let projected = record.scheduled_hours + hours;

        if projected <= record.adjusted_weekly_limit {
            return Some(Allowance::WithinLimit);
        }
        if is_weekend && projected <= record.base_weekly_limit + WEEKEND_OVERAGE_HOURS {
            return Some(Allowance::WeekendOverride);
        }
        if projected <= record.base_weekly_limit + EMERGENCY_OVERAGE_HOURS {
            return Some(Allowance::EmergencyOverride);
        }
        None
    }

    /// Books `hours` against the member's record. A weekend-override commit
    /// (only reachable when the within-limit tier failed) marks the record
    /// and notes the overage.
    pub(super) fn commit(&mut self, member: &MemberId, hours: f64, tier: Allowance) {
        let record = self.get_or_init(member);
        record.scheduled_hours += hours;
        record.actual_hours += hours;
        if tier == Allowance::WeekendOverride {
            record.is_weekend_override = true;
            record.notes = format!("weekend scheduling required {hours}h overage");
        }
    }

    /// Books hours for a forced assignment outside every tier, keeping the
    /// totals truthful so the validator can flag the overage.
    pub(super) fn commit_forced(&mut self, member: &MemberId, hours: f64) {
        let record = self.get_or_init(member);
        record.scheduled_hours += hours;
        record.actual_hours += hours;
        record.notes = format!("forced cover assignment of {hours}h past weekly ceiling");
    }

    /// Merges the working set back into the dataset, replacing any prior
    /// records for this team-week.
    pub(super) fn merge_into(self, rota: &mut Rota) {
        rota.weekly_hours.retain(|r| {
            !(r.team == self.team
                && r.week_start == self.week_start
                && self.records.contains_key(&r.member))
        });
        rota.weekly_hours.extend(self.records.into_values());
    }
}
