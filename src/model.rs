use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strong identifier for Member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for Team
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(String);

impl TeamId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for Schedule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(String);

impl ScheduleId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for Timeslot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(String);

impl SlotId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strong identifier for SwapRequest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapId(String);

impl SwapId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Directory entry for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub handle: String,
    pub display_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Member {
    pub fn new<H: Into<String>, D: Into<String>>(handle: H, display_name: D) -> Self {
        Self {
            id: MemberId::random(),
            handle: handle.into(),
            display_name: display_name.into(),
            active: true,
        }
    }
}

/// Membership record; insertion order is the rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub member: MemberId,
    pub active: bool,
}

/// Per-team scheduling tunables. Bounds are enforced at construction:
/// slot duration in [1, 8] hours, break in [1, 24] hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub slot_duration_hours: u8,
    pub min_break_hours: u8,
}

impl ScheduleConfig {
    pub fn new(slot_duration_hours: u8, min_break_hours: u8) -> Result<Self, String> {
        if slot_duration_hours == 0 || slot_duration_hours > 8 {
            return Err("slot duration must be between 1 and 8 hours".to_string());
        }
        if min_break_hours == 0 || min_break_hours > 24 {
            return Err("minimum break must be between 1 and 24 hours".to_string());
        }
        Ok(Self {
            slot_duration_hours,
            min_break_hours,
        })
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_duration_hours: 8,
            min_break_hours: 12,
        }
    }
}

/// Team with an ordered membership list and its schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub config: ScheduleConfig,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Team {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: TeamId::random(),
            name: name.into(),
            active: true,
            config: ScheduleConfig::default(),
            memberships: Vec::new(),
        }
    }

    /// Adds a membership, or reactivates an inactive one. A reactivated
    /// member keeps its original rotation position.
    pub fn add_member(&mut self, member: MemberId) {
        if let Some(m) = self.memberships.iter_mut().find(|m| m.member == member) {
            m.active = true;
        } else {
            self.memberships.push(Membership {
                member,
                active: true,
            });
        }
    }

    pub fn set_member_active(&mut self, member: &MemberId, active: bool) -> bool {
        match self.memberships.iter_mut().find(|m| &m.member == member) {
            Some(m) => {
                m.active = active;
                true
            }
            None => false,
        }
    }

    /// Active members in join order. This ordering is what makes the
    /// round-robin rotation deterministic.
    pub fn active_members(&self) -> Vec<MemberId> {
        self.memberships
            .iter()
            .filter(|m| m.active)
            .map(|m| m.member.clone())
            .collect()
    }

    pub fn is_active_member(&self, member: &MemberId) -> bool {
        self.memberships
            .iter()
            .any(|m| &m.member == member && m.active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
}

/// One atomic assignable unit inside a weekly schedule (UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: SlotId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_break: bool,
    pub assigned: Option<MemberId>,
}

impl Timeslot {
    /// Creates a slot, validating that `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if end <= start {
            return Err("slot end must be strictly after start".to_string());
        }
        Ok(Self {
            id: SlotId::random(),
            start,
            end,
            is_break: false,
            assigned: None,
        })
    }

    /// Duration in hours; derived, never stored.
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / 60.0
    }
}

/// Validation verdict for one schedule, recomputed wholesale on each pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub has_sufficient_members: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Weekly schedule of a team, Monday through Sunday, owning its slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub team: TeamId,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub status: ScheduleStatus,
    #[serde(default)]
    pub slots: Vec<Timeslot>,
    #[serde(default)]
    pub validation: Option<ValidationReport>,
}

impl Schedule {
    pub fn new(
        team: TeamId,
        week_start: NaiveDate,
        status: ScheduleStatus,
    ) -> Result<Self, String> {
        if week_start.weekday() != Weekday::Mon {
            return Err(format!("week start {week_start} is not a Monday"));
        }
        Ok(Self {
            id: ScheduleId::random(),
            team,
            week_start,
            week_end: week_start + chrono::Days::new(6),
            status,
            slots: Vec::new(),
            validation: None,
        })
    }

    pub fn find_slot(&self, id: &SlotId) -> Option<&Timeslot> {
        self.slots.iter().find(|s| &s.id == id)
    }

    pub fn find_slot_mut(&mut self, id: &SlotId) -> Option<&mut Timeslot> {
        self.slots.iter_mut().find(|s| &s.id == id)
    }
}

/// Running hour totals for one member over one team-week.
/// `adjusted_weekly_limit` may rise above the base through overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHoursRecord {
    pub member: MemberId,
    pub team: TeamId,
    pub week_start: NaiveDate,
    pub base_weekly_limit: f64,
    pub adjusted_weekly_limit: f64,
    pub scheduled_hours: f64,
    pub actual_hours: f64,
    #[serde(default)]
    pub is_weekend_override: bool,
    #[serde(default)]
    pub notes: String,
}

impl WeeklyHoursRecord {
    pub fn new(member: MemberId, team: TeamId, week_start: NaiveDate) -> Self {
        Self {
            member,
            team,
            week_start,
            base_weekly_limit: crate::planner::MAX_WEEKLY_HOURS,
            adjusted_weekly_limit: crate::planner::MAX_WEEKLY_HOURS,
            scheduled_hours: 0.0,
            actual_hours: 0.0,
            is_weekend_override: false,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Processed,
    Rejected,
    Expired,
}

/// Bilateral slot exchange between two members, time-boxed by a deadline
/// 24 hours before the earlier slot starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: SwapId,
    pub requester: MemberId,
    pub responder: MemberId,
    pub requester_slot: SlotId,
    pub responder_slot: SlotId,
    pub status: SwapStatus,
    pub requested_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl SwapRequest {
    pub fn is_pending(&self) -> bool {
        self.status == SwapStatus::Pending
    }

    /// Still actionable: pending, before the deadline, and both slots still
    /// owned by the original parties. Guards against stale requests after an
    /// unrelated reassignment.
    pub fn is_valid(
        &self,
        now: DateTime<Utc>,
        requester_slot: &Timeslot,
        responder_slot: &Timeslot,
    ) -> bool {
        self.is_pending()
            && now < self.deadline
            && requester_slot.assigned.as_ref() == Some(&self.requester)
            && responder_slot.assigned.as_ref() == Some(&self.responder)
    }
}

/// Complete dataset the planner operates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rota {
    pub members: Vec<Member>,
    pub teams: Vec<Team>,
    pub schedules: Vec<Schedule>,
    pub weekly_hours: Vec<WeeklyHoursRecord>,
    pub swaps: Vec<SwapRequest>,
}

impl Rota {
    pub fn find_member_by_handle<'a>(&'a self, handle: &str) -> Option<&'a Member> {
        self.members.iter().find(|m| m.handle == handle)
    }
    pub fn find_member<'a>(&'a self, id: &MemberId) -> Option<&'a Member> {
        self.members.iter().find(|m| &m.id == id)
    }
    pub fn find_team<'a>(&'a self, id: &TeamId) -> Option<&'a Team> {
        self.teams.iter().find(|t| &t.id == id)
    }
    pub fn find_team_by_name<'a>(&'a self, name: &str) -> Option<&'a Team> {
        self.teams.iter().find(|t| t.name == name)
    }
    pub fn find_team_mut(&mut self, id: &TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| &t.id == id)
    }
    pub fn find_schedule<'a>(&'a self, id: &ScheduleId) -> Option<&'a Schedule> {
        self.schedules.iter().find(|s| &s.id == id)
    }
    pub fn find_schedule_mut(&mut self, id: &ScheduleId) -> Option<&mut Schedule> {
        self.schedules.iter_mut().find(|s| &s.id == id)
    }
    pub fn find_schedule_for_week<'a>(
        &'a self,
        team: &TeamId,
        week_start: NaiveDate,
    ) -> Option<&'a Schedule> {
        self.schedules
            .iter()
            .find(|s| &s.team == team && s.week_start == week_start)
    }

    /// Locates a slot together with its owning schedule.
    pub fn find_slot<'a>(&'a self, id: &SlotId) -> Option<(&'a Schedule, &'a Timeslot)> {
        self.schedules
            .iter()
            .find_map(|sched| sched.find_slot(id).map(|slot| (sched, slot)))
    }

    pub fn find_weekly_record<'a>(
        &'a self,
        member: &MemberId,
        team: &TeamId,
        week_start: NaiveDate,
    ) -> Option<&'a WeeklyHoursRecord> {
        self.weekly_hours
            .iter()
            .find(|r| &r.member == member && &r.team == team && r.week_start == week_start)
    }

    pub fn find_swap<'a>(&'a self, id: &SwapId) -> Option<&'a SwapRequest> {
        self.swaps.iter().find(|s| &s.id == id)
    }
    pub fn find_swap_mut(&mut self, id: &SwapId) -> Option<&mut SwapRequest> {
        self.swaps.iter_mut().find(|s| &s.id == id)
    }
}
