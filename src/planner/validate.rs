use super::types::{required_members, PlanError, MAX_DAILY_HOURS, MAX_WEEKLY_HOURS, WEEKEND_OVERAGE_HOURS};
use crate::model::{MemberId, Rota, Schedule, Timeslot, ValidationReport};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Post-hoc check of a generated schedule against coverage and hour-limit
/// invariants. Errors block, warnings do not; the daily cap is re-checked
/// here independently of assignment-time enforcement.
pub(super) fn validate_schedule(
    rota: &Rota,
    schedule: &Schedule,
) -> Result<ValidationReport, PlanError> {
    let team = rota
        .find_team(&schedule.team)
        .ok_or_else(|| PlanError::not_found("team", schedule.team.as_str()))?;

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let unassigned = schedule
        .slots
        .iter()
        .filter(|s| !s.is_break && s.assigned.is_none())
        .count();
    if unassigned > 0 {
        errors.push(format!("{unassigned} timeslots are unassigned"));
    }

    let active = team.active_members();
    for member_id in &active {
        let label = member_label(rota, member_id);
        let member_slots: Vec<&Timeslot> = schedule
            .slots
            .iter()
            .filter(|s| !s.is_break && s.assigned.as_ref() == Some(member_id))
            .collect();
        let total: f64 = member_slots.iter().map(|s| s.duration_hours()).sum();

        match rota.find_weekly_record(member_id, &schedule.team, schedule.week_start) {
            Some(record) => {
                if total > record.adjusted_weekly_limit {
                    if record.is_weekend_override {
                        warnings.push(format!(
                            "member {label} has weekend override: {total}h (limit: {}h)",
                            record.adjusted_weekly_limit
                        ));
                    } else {
                        errors.push(format!(
                            "member {label} exceeds adjusted weekly limit: {total}h (limit: {}h)",
                            record.adjusted_weekly_limit
                        ));
                    }
                }
                if total > record.base_weekly_limit + WEEKEND_OVERAGE_HOURS {
                    errors.push(format!(
                        "member {label} has excessive overage: {total}h (base limit: {}h)",
                        record.base_weekly_limit
                    ));
                }
            }
            None => {
                if total > MAX_WEEKLY_HOURS {
                    errors.push(format!(
                        "member {label} exceeds base weekly limit: {total}h (limit: {MAX_WEEKLY_HOURS}h)"
                    ));
                }
            }
        }

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for slot in &member_slots {
            *daily.entry(slot.start.date_naive()).or_insert(0.0) += slot.duration_hours();
        }
        for (date, hours) in daily {
            if hours > MAX_DAILY_HOURS {
                errors.push(format!(
                    "member {label} exceeds {MAX_DAILY_HOURS} hours on {date} ({hours}h)"
                ));
            }
        }
    }

    let required = required_members();
    let has_sufficient_members = active.len() >= required;
    if !has_sufficient_members {
        errors.push(format!(
            "insufficient members: need {required}, have {}",
            active.len()
        ));
    }

    Ok(ValidationReport {
        is_valid: errors.is_empty(),
        has_sufficient_members,
        errors,
        warnings,
    })
}

fn member_label(rota: &Rota, id: &MemberId) -> String {
    rota.find_member(id)
        .map(|m| m.handle.clone())
        .unwrap_or_else(|| id.as_str().to_string())
}
