#![forbid(unsafe_code)]
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rotaplan::{
    planner::{AssignPolicy, PlanError, Planner},
    Member, MemberId, Rota, Schedule, ScheduleId, SlotId, SwapStatus, Team, TeamId,
};

const HANDLES: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn setup_published() -> (Planner, TeamId, ScheduleId) {
    let mut rota = Rota::default();
    let mut team = Team::new("core");
    for handle in HANDLES {
        let member = Member::new(handle, handle);
        team.add_member(member.id.clone());
        rota.members.push(member);
    }
    let team_id = team.id.clone();
    rota.teams.push(team);

    let mut planner = Planner::from_rota(rota);
    let outcome = planner
        .generate_for_team_week(&team_id, monday(), true, AssignPolicy::default())
        .unwrap();
    (planner, team_id, outcome.schedule_id)
}

/// First assigned slot on `date`, skipping slots owned by `exclude`.
fn slot_on(schedule: &Schedule, date: NaiveDate, exclude: Option<&MemberId>) -> (SlotId, MemberId) {
    let slot = schedule
        .slots
        .iter()
        .find(|s| {
            s.start.date_naive() == date
                && s.assigned.is_some()
                && exclude.map_or(true, |m| s.assigned.as_ref() != Some(m))
        })
        .unwrap();
    (slot.id.clone(), slot.assigned.clone().unwrap())
}

fn assignee(planner: &Planner, slot: &SlotId) -> Option<MemberId> {
    planner
        .rota()
        .find_slot(slot)
        .and_then(|(_, s)| s.assigned.clone())
}

fn before_deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 12, 30, 12, 0, 0).unwrap()
}

#[test]
fn accept_before_deadline_exchanges_both_slots() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, responder) = slot_on(schedule, tuesday, Some(&requester));

    let now = before_deadline();
    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, now)
        .unwrap();

    assert_eq!(request.status, SwapStatus::Pending);
    assert_eq!(request.responder, responder);
    // deadline sits 24h before the earlier of the two slots
    let resp_start = planner.rota().find_slot(&resp_slot).unwrap().1.start;
    let req_start = planner.rota().find_slot(&req_slot).unwrap().1.start;
    assert_eq!(request.deadline, req_start.min(resp_start) - Duration::hours(24));

    let accepted = planner.accept_swap(&request.id, &responder, now).unwrap();
    assert_eq!(accepted.status, SwapStatus::Processed);
    assert_eq!(accepted.processed_at, Some(now));
    assert_eq!(assignee(&planner, &req_slot), Some(responder));
    assert_eq!(assignee(&planner, &resp_slot), Some(requester));
}

#[test]
fn accept_after_deadline_leaves_slots_unchanged() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, responder) = slot_on(schedule, tuesday, Some(&requester));

    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();

    let late = request.deadline + Duration::hours(1);
    let err = planner.accept_swap(&request.id, &responder, late).unwrap_err();
    assert!(matches!(err, PlanError::State(_)));

    assert_eq!(assignee(&planner, &req_slot), Some(requester));
    assert_eq!(assignee(&planner, &resp_slot), Some(responder));
    let stored = planner.rota().find_swap(&request.id).unwrap();
    assert_eq!(stored.status, SwapStatus::Pending);
}

#[test]
fn duplicate_slot_pair_is_a_conflict() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, _) = slot_on(schedule, tuesday, Some(&requester));

    planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();
    let err = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::Conflict(_)));
    assert_eq!(planner.rota().swaps.len(), 1);
}

#[test]
fn slot_with_pending_request_rejects_another() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let thursday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, responder) = slot_on(schedule, tuesday, Some(&requester));
    let (other_slot, other) = slot_on(schedule, thursday, Some(&responder));

    planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();
    // a different pair touching the same responder slot
    let err = planner
        .create_swap(&other, &other_slot, &resp_slot, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::Conflict(_)));
}

#[test]
fn reject_records_reason_without_touching_slots() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, responder) = slot_on(schedule, tuesday, Some(&requester));

    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();
    let rejected = planner
        .reject_swap(&request.id, &responder, "on leave that day")
        .unwrap();

    assert_eq!(rejected.status, SwapStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("on leave that day"));
    assert_eq!(assignee(&planner, &req_slot), Some(requester));
    assert_eq!(assignee(&planner, &resp_slot), Some(responder.clone()));

    // terminal state: a later accept is a state error
    let err = planner
        .accept_swap(&request.id, &responder, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::State(_)));
}

#[test]
fn only_the_responder_may_answer() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, _) = slot_on(schedule, tuesday, Some(&requester));

    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();

    let err = planner
        .accept_swap(&request.id, &requester, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::State(_)));
    let err = planner
        .reject_swap(&request.id, &requester, "nope")
        .unwrap_err();
    assert!(matches!(err, PlanError::State(_)));
}

#[test]
fn stale_ownership_blocks_acceptance() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, responder) = slot_on(schedule, tuesday, Some(&requester));

    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();

    // an unrelated reassignment invalidates the request
    let somebody_else = planner.rota().members[0].id.clone();
    let replacement = if somebody_else == requester {
        planner.rota().members[1].id.clone()
    } else {
        somebody_else
    };
    planner
        .rota_mut()
        .find_schedule_mut(&schedule_id)
        .unwrap()
        .find_slot_mut(&req_slot)
        .unwrap()
        .assigned = Some(replacement.clone());

    let err = planner
        .accept_swap(&request.id, &responder, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::State(_)));
    assert_eq!(assignee(&planner, &req_slot), Some(replacement));
    assert_eq!(assignee(&planner, &resp_slot), Some(responder));
}

#[test]
fn expiry_sweep_is_idempotent() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, _) = slot_on(schedule, tuesday, Some(&requester));

    let request = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap();

    let late = request.deadline + Duration::minutes(1);
    assert_eq!(planner.expire_swaps(late), vec![request.id.clone()]);
    assert!(planner.expire_swaps(late).is_empty());
    let stored = planner.rota().find_swap(&request.id).unwrap();
    assert_eq!(stored.status, SwapStatus::Expired);
}

#[test]
fn swapping_with_yourself_is_invalid() {
    let (mut planner, _, schedule_id) = setup_published();
    let schedule = planner.rota().find_schedule(&schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let (first, owner) = slot_on(schedule, wednesday, None);
    // the rotation hands the same member several slots per day
    let second = schedule
        .slots
        .iter()
        .find(|s| s.assigned.as_ref() == Some(&owner) && s.id != first)
        .unwrap()
        .id
        .clone();

    let err = planner
        .create_swap(&owner, &first, &second, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::Invalid(_)));
}

#[test]
fn draft_schedules_do_not_accept_swaps() {
    let mut rota = Rota::default();
    let mut team = Team::new("core");
    for handle in HANDLES {
        let member = Member::new(handle, handle);
        team.add_member(member.id.clone());
        rota.members.push(member);
    }
    let team_id = team.id.clone();
    rota.teams.push(team);

    let mut planner = Planner::from_rota(rota);
    let outcome = planner
        .generate_for_team_week(&team_id, monday(), false, AssignPolicy::default())
        .unwrap();

    let schedule = planner.rota().find_schedule(&outcome.schedule_id).unwrap();
    let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let (req_slot, requester) = slot_on(schedule, wednesday, None);
    let (resp_slot, _) = slot_on(schedule, tuesday, Some(&requester));

    let err = planner
        .create_swap(&requester, &req_slot, &resp_slot, before_deadline())
        .unwrap_err();
    assert!(matches!(err, PlanError::State(_)));
}
