use super::types::{PlanError, SWAP_NOTICE_HOURS};
use super::Planner;
use crate::model::{
    MemberId, Rota, ScheduleStatus, SlotId, SwapId, SwapRequest, SwapStatus,
};
use chrono::{DateTime, Duration, Utc};

/// Creates a pending swap request between two published slots.
///
/// Both slots must sit in published schedules of the same team and week, be
/// owned by the two parties, and be free of other pending requests; the
/// (requester_slot, responder_slot) pair is unique over the request history.
pub(super) fn create_swap(
    planner: &mut Planner,
    requester: &MemberId,
    requester_slot: &SlotId,
    responder_slot: &SlotId,
    now: DateTime<Utc>,
) -> Result<SwapRequest, PlanError> {
    if requester_slot == responder_slot {
        return Err(PlanError::Invalid(
            "a swap needs two distinct slots".to_string(),
        ));
    }

    let (req_sched, req_slot) = planner
        .rota
        .find_slot(requester_slot)
        .ok_or_else(|| PlanError::not_found("timeslot", requester_slot.as_str()))?;
    let (resp_sched, resp_slot) = planner
        .rota
        .find_slot(responder_slot)
        .ok_or_else(|| PlanError::not_found("timeslot", responder_slot.as_str()))?;

    if req_slot.is_break || resp_slot.is_break {
        return Err(PlanError::Invalid("break slots cannot be swapped".to_string()));
    }
    if req_sched.team != resp_sched.team {
        return Err(PlanError::Invalid(
            "slots belong to different teams".to_string(),
        ));
    }
    if req_sched.week_start != resp_sched.week_start {
        return Err(PlanError::Invalid(
            "slots belong to different weeks".to_string(),
        ));
    }
    if req_sched.status != ScheduleStatus::Published
        || resp_sched.status != ScheduleStatus::Published
    {
        return Err(PlanError::State(
            "swaps operate on published schedules only".to_string(),
        ));
    }
    if req_slot.assigned.as_ref() != Some(requester) {
        return Err(PlanError::State(
            "requester is not assigned to the offered slot".to_string(),
        ));
    }
    let responder = resp_slot.assigned.clone().ok_or_else(|| {
        PlanError::State("responder slot has no assignee".to_string())
    })?;
    if &responder == requester {
        return Err(PlanError::Invalid(
            "cannot swap a slot with yourself".to_string(),
        ));
    }

    let team = planner
        .rota
        .find_team(&req_sched.team)
        .ok_or_else(|| PlanError::not_found("team", req_sched.team.as_str()))?;
    if !team.is_active_member(requester) || !team.is_active_member(&responder) {
        return Err(PlanError::State(
            "both parties must be active team members".to_string(),
        ));
    }

    for existing in &planner.rota.swaps {
        if existing.requester_slot == *requester_slot
            && existing.responder_slot == *responder_slot
        {
            return Err(PlanError::Conflict(
                "swap already requested for this slot pair".to_string(),
            ));
        }
        if existing.is_pending()
            && [&existing.requester_slot, &existing.responder_slot]
                .iter()
                .any(|s| *s == requester_slot || *s == responder_slot)
        {
            return Err(PlanError::Conflict(
                "slot already has a pending swap request".to_string(),
            ));
        }
    }

    let first_start = req_slot.start.min(resp_slot.start);
    let request = SwapRequest {
        id: SwapId::random(),
        requester: requester.clone(),
        responder,
        requester_slot: requester_slot.clone(),
        responder_slot: responder_slot.clone(),
        status: SwapStatus::Pending,
        requested_at: now,
        deadline: first_start - Duration::hours(SWAP_NOTICE_HOURS),
        processed_at: None,
        rejection_reason: None,
    };
    planner.rota.swaps.push(request.clone());
    Ok(request)
}

/// Accepts a pending request (responder only) and executes the exchange
/// immediately; `processed` is the sole success terminal. Any failure during
/// the exchange falls back to `rejected` so a half-applied swap can never
/// rest in `pending`.
pub(super) fn accept_swap(
    planner: &mut Planner,
    id: &SwapId,
    responder: &MemberId,
    now: DateTime<Utc>,
) -> Result<SwapRequest, PlanError> {
    let swap = planner
        .rota
        .find_swap(id)
        .ok_or_else(|| PlanError::not_found("swap request", id.as_str()))?
        .clone();

    if &swap.responder != responder {
        return Err(PlanError::State(
            "only the responder may accept a swap".to_string(),
        ));
    }
    if !swap.is_pending() {
        return Err(PlanError::State(format!(
            "swap request is not pending (status: {:?})",
            swap.status
        )));
    }
    if now >= swap.deadline {
        return Err(PlanError::State(
            "swap deadline has passed".to_string(),
        ));
    }
    {
        let (_, req_slot) = planner
            .rota
            .find_slot(&swap.requester_slot)
            .ok_or_else(|| PlanError::not_found("timeslot", swap.requester_slot.as_str()))?;
        let (_, resp_slot) = planner
            .rota
            .find_slot(&swap.responder_slot)
            .ok_or_else(|| PlanError::not_found("timeslot", swap.responder_slot.as_str()))?;
        if !swap.is_valid(now, req_slot, resp_slot) {
            return Err(PlanError::State(
                "slot ownership changed since the request was made".to_string(),
            ));
        }
    }

    match exchange_assignments(&mut planner.rota, &swap) {
        Ok(()) => {
            let stored = planner
                .rota
                .find_swap_mut(id)
                .ok_or_else(|| PlanError::not_found("swap request", id.as_str()))?;
            stored.status = SwapStatus::Processed;
            stored.processed_at = Some(now);
            Ok(stored.clone())
        }
        Err(err) => {
            let reason = format!("processing failed: {err}");
            if let Some(stored) = planner.rota.find_swap_mut(id) {
                stored.status = SwapStatus::Rejected;
                stored.rejection_reason = Some(reason);
            }
            Err(err)
        }
    }
}

/// Performs the two-slot exchange. Both slot positions are resolved before
/// either write so the mutation is all or nothing.
fn exchange_assignments(rota: &mut Rota, swap: &SwapRequest) -> Result<(), PlanError> {
    let req_loc = locate_slot(rota, &swap.requester_slot)?;
    let resp_loc = locate_slot(rota, &swap.responder_slot)?;

    rota.schedules[req_loc.0].slots[req_loc.1].assigned = Some(swap.responder.clone());
    rota.schedules[resp_loc.0].slots[resp_loc.1].assigned = Some(swap.requester.clone());
    Ok(())
}

fn locate_slot(rota: &Rota, id: &SlotId) -> Result<(usize, usize), PlanError> {
    for (sched_idx, sched) in rota.schedules.iter().enumerate() {
        if let Some(slot_idx) = sched.slots.iter().position(|s| &s.id == id) {
            return Ok((sched_idx, slot_idx));
        }
    }
    Err(PlanError::not_found("timeslot", id.as_str()))
}

/// Rejects a pending request (responder only); no slot mutation.
pub(super) fn reject_swap(
    planner: &mut Planner,
    id: &SwapId,
    responder: &MemberId,
    reason: &str,
) -> Result<SwapRequest, PlanError> {
    let swap = planner
        .rota
        .find_swap_mut(id)
        .ok_or_else(|| PlanError::not_found("swap request", id.as_str()))?;

    if &swap.responder != responder {
        return Err(PlanError::State(
            "only the responder may reject a swap".to_string(),
        ));
    }
    if !swap.is_pending() {
        return Err(PlanError::State(format!(
            "swap request is not pending (status: {:?})",
            swap.status
        )));
    }

    swap.status = SwapStatus::Rejected;
    swap.rejection_reason = Some(reason.to_string());
    Ok(swap.clone())
}

/// Idempotent sweep moving overdue pending requests to `expired`. Expiry is
/// otherwise passive; this entry point exists for an external scheduler.
pub(super) fn expire_overdue(planner: &mut Planner, now: DateTime<Utc>) -> Vec<SwapId> {
    let mut expired = Vec::new();
    for swap in &mut planner.rota.swaps {
        if swap.is_pending() && now >= swap.deadline {
            swap.status = SwapStatus::Expired;
            expired.push(swap.id.clone());
        }
    }
    expired
}
