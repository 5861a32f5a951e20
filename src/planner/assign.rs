use super::ledger::Ledger;
use super::types::AssignPolicy;
use crate::model::{MemberId, Rota, Timeslot};
use chrono::{Datelike, NaiveDate, Weekday};

/// Round-robin assignment over the ordered member list.
///
/// For each non-break slot, at most `members.len()` candidates are scanned
/// starting at the rotation cursor; the first with an allowance wins. The
/// cursor advances on every failed candidate and once more after every slot,
/// which spreads assignment opportunity rather than just successes. A slot
/// nobody qualifies for is left unassigned for the validator to surface,
/// unless the policy forces cover.
pub(super) fn assign_rotation(
    rota: &Rota,
    members: &[MemberId],
    slots: &mut [Timeslot],
    ledger: &mut Ledger,
    policy: AssignPolicy,
) {
    if members.is_empty() {
        return;
    }
    let total = members.len();
    let mut cursor = 0usize;

    for index in 0..slots.len() {
        if slots[index].is_break {
            continue;
        }
        let hours = slots[index].duration_hours();
        let date = slots[index].start.date_naive();
        let weekend = is_weekend(&slots[index]);

        let mut chosen = None;
        for _ in 0..total {
            let member = &members[cursor];
            let daily = daily_hours(rota, slots, member, date);
            if let Some(tier) = ledger.can_take(member, hours, weekend, daily) {
                chosen = Some((member.clone(), tier));
                break;
            }
            cursor = (cursor + 1) % total;
        }

        match chosen {
            Some((member, tier)) => {
                ledger.commit(&member, hours, tier);
                slots[index].assigned = Some(member);
            }
            None if policy.force_cover => {
                let member = members[0].clone();
                ledger.commit_forced(&member, hours);
                slots[index].assigned = Some(member);
            }
            None => {}
        }

        cursor = (cursor + 1) % total;
    }
}

fn is_weekend(slot: &Timeslot) -> bool {
    matches!(slot.start.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Hours already booked for a member on a calendar date: slots assigned so
/// far in the schedule under construction plus anything persisted for the
/// same date in other schedules (cross-team daily safety).
fn daily_hours(rota: &Rota, local: &[Timeslot], member: &MemberId, date: NaiveDate) -> f64 {
    let building: f64 = local
        .iter()
        .filter(|s| {
            !s.is_break && s.assigned.as_ref() == Some(member) && s.start.date_naive() == date
        })
        .map(Timeslot::duration_hours)
        .sum();

    let persisted: f64 = rota
        .schedules
        .iter()
        .flat_map(|sched| sched.slots.iter())
        .filter(|s| {
            !s.is_break && s.assigned.as_ref() == Some(member) && s.start.date_naive() == date
        })
        .map(Timeslot::duration_hours)
        .sum();

    building + persisted
}
