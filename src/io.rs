use crate::model::{Member, Rota, Schedule};
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Member import from CSV: header `handle,display_name[,active]`
pub fn import_members_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Member>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let handle = rec.get(0).context("missing handle")?.trim();
        let display = rec.get(1).context("missing display_name")?.trim();
        if handle.is_empty() || display.is_empty() {
            bail!("invalid member row (empty)");
        }
        let mut member = Member::new(handle.to_string(), display.to_string());
        if let Some(flag) = rec.get(2) {
            let flag = flag.trim();
            if !flag.is_empty() {
                member.active = parse_bool(flag)
                    .with_context(|| format!("invalid active value for handle {handle}"))?;
            }
        }
        out.push(member);
    }
    Ok(out)
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// JSON export of the whole rota (pretty-printed)
pub fn export_rota_json<P: AsRef<Path>>(path: P, rota: &Rota) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(rota)?;
    fs::write(path, s)?;
    Ok(())
}

/// CSV export of one schedule's slots:
/// header `slot_id,start,end,is_break,assigned_handle`
pub fn export_schedule_csv<P: AsRef<Path>>(
    path: P,
    rota: &Rota,
    schedule: &Schedule,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["slot_id", "start", "end", "is_break", "assigned_handle"])?;
    for slot in &schedule.slots {
        let assigned = slot
            .assigned
            .as_ref()
            .and_then(|mid| rota.find_member(mid))
            .map(|m| m.handle.as_str())
            .unwrap_or("");
        let start = slot.start.to_rfc3339();
        let end = slot.end.to_rfc3339();
        let is_break = if slot.is_break { "true" } else { "false" };
        w.write_record([slot.id.as_str(), start.as_str(), end.as_str(), is_break, assigned])?;
    }
    w.flush()?;
    Ok(())
}

/// CSV export of a schedule's validation outcome, one finding per row:
/// header `severity,message`
pub fn export_validation_csv<P: AsRef<Path>>(path: P, schedule: &Schedule) -> anyhow::Result<()> {
    let Some(validation) = schedule.validation.as_ref() else {
        bail!("schedule has no validation report");
    };
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["severity", "message"])?;
    for err in &validation.errors {
        w.write_record(["error", err])?;
    }
    for warn in &validation.warnings {
        w.write_record(["warning", warn])?;
    }
    w.flush()?;
    Ok(())
}
