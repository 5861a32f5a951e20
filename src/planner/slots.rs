use super::types::{PlanError, HOURS_PER_WEEK};
use crate::model::Timeslot;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};

/// Partitions a week into 168 contiguous 1-hour coverage units.
///
/// The hourly decomposition is fixed regardless of the configured shift
/// length; it is what lets daily-cap enforcement work at hour granularity.
pub(super) fn generate_week_slots(week_start: NaiveDate) -> Result<Vec<Timeslot>, PlanError> {
    ensure_monday(week_start)?;

    let start = Utc.from_utc_datetime(
        &week_start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| PlanError::Invalid(format!("invalid week start {week_start}")))?,
    );

    let mut slots = Vec::with_capacity(HOURS_PER_WEEK as usize);
    let mut cursor = start;
    let week_end = start + Duration::days(7);

    while cursor < week_end {
        let end = cursor + Duration::hours(1);
        let slot = Timeslot::new(cursor, end).map_err(PlanError::Invalid)?;
        slots.push(slot);
        cursor = end;
    }

    Ok(slots)
}

pub(super) fn ensure_monday(week_start: NaiveDate) -> Result<(), PlanError> {
    if week_start.weekday() != Weekday::Mon {
        return Err(PlanError::Invalid(format!(
            "week start {week_start} is not a Monday"
        )));
    }
    Ok(())
}
