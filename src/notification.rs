use crate::model::{Member, Rota, Timeslot};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};

/// A rendered reminder for one member's next shift.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub member_handle: String,
    pub slot_id: String,
    pub notice_at: DateTime<Utc>,
    pub content: String,
}

/// Customizes the message rendering (plain text, SMS, ...). Delivery is the
/// caller's concern.
pub trait ReminderRenderer {
    fn render(&self, member: &Member, slot: &Timeslot, notice_at: DateTime<Utc>) -> String;
}

/// Simple text template intended for a future mail/SMS hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReminder;

impl ReminderRenderer for TextReminder {
    fn render(&self, member: &Member, slot: &Timeslot, notice_at: DateTime<Utc>) -> String {
        format!(
            "Hello {name},\n\nYou are on call from {start} to {end}.\nThis message was generated at {notice}.\n\nPlease confirm your availability and check your equipment.\n",
            name = member.display_name,
            start = slot.start.to_rfc3339(),
            end = slot.end.to_rfc3339(),
            notice = notice_at.to_rfc3339()
        )
    }
}

/// Prepares a reminder for a member's next assigned slot.
pub fn prepare_reminder(
    rota: &Rota,
    handle: &str,
    days_before: i64,
    now: DateTime<Utc>,
    renderer: &dyn ReminderRenderer,
) -> Result<Reminder> {
    if days_before < 0 {
        bail!("days_before must be positive");
    }

    let member = rota
        .find_member_by_handle(handle)
        .with_context(|| format!("unknown member handle: {handle}"))?;

    let mut upcoming: Vec<&Timeslot> = rota
        .schedules
        .iter()
        .flat_map(|sched| sched.slots.iter())
        .filter(|slot| {
            !slot.is_break && slot.assigned.as_ref() == Some(&member.id) && slot.start >= now
        })
        .collect();

    if upcoming.is_empty() {
        bail!("no upcoming shift found for handle {handle}");
    }

    upcoming.sort_by_key(|slot| slot.start);
    let slot = upcoming[0];

    let notice_at = slot.start - Duration::days(days_before);

    let content = renderer.render(member, slot, notice_at);
    Ok(Reminder {
        member_handle: member.handle.clone(),
        slot_id: slot.id.as_str().to_string(),
        notice_at,
        content,
    })
}
