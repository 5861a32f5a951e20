#![forbid(unsafe_code)]
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rotaplan::{
    io,
    model::{Member, ScheduleConfig, ScheduleId, SlotId, SwapId, Team, TeamId},
    notification::{prepare_reminder, TextReminder},
    planner::{AssignPolicy, Planner},
    storage::{JsonStorage, Storage},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Minimal on-call rotation CLI (no database)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Enable logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// JSON rota file
    #[arg(long, global = true, default_value = "rota.json")]
    rota: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a member to the directory
    AddMember {
        #[arg(long)]
        handle: String,
        #[arg(long)]
        display_name: String,
    },

    /// Import members from a CSV
    ImportMembers {
        #[arg(long)]
        csv: String,
    },

    /// Create a team
    AddTeam {
        #[arg(long)]
        name: String,
    },

    /// Set a team's scheduling tunables
    Configure {
        #[arg(long)]
        team: String,
        /// Shift length in hours (1-8)
        #[arg(long, default_value_t = 8)]
        slot_duration_hours: u8,
        /// Minimum break between shifts in hours (1-24)
        #[arg(long, default_value_t = 12)]
        min_break_hours: u8,
    },

    /// Add (or reactivate) a member in a team's rotation
    Join {
        #[arg(long)]
        team: String,
        #[arg(long)]
        handle: String,
        /// Regenerate the team's schedules from this Monday onwards
        #[arg(long)]
        regenerate_from: Option<String>,
    },

    /// Deactivate a member in a team's rotation
    Leave {
        #[arg(long)]
        team: String,
        #[arg(long)]
        handle: String,
        /// Regenerate the team's schedules from this Monday onwards
        #[arg(long)]
        regenerate_from: Option<String>,
    },

    /// Generate one team's schedule for a week
    Generate {
        #[arg(long)]
        team: String,
        /// Monday, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
        #[arg(long)]
        publish: bool,
        /// Force-assign uncoverable slots to the first member
        #[arg(long)]
        force_cover: bool,
    },

    /// Generate schedules for every active team
    GenerateAll {
        /// Monday, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
        #[arg(long)]
        publish: bool,
    },

    /// Regenerate a team's schedules from a date onwards
    Regenerate {
        #[arg(long)]
        team: String,
        /// YYYY-MM-DD
        #[arg(long)]
        from: String,
    },

    /// Re-validate a schedule
    Validate {
        #[arg(long)]
        schedule_id: String,
    },

    /// Publish a draft schedule
    Publish {
        #[arg(long)]
        schedule_id: String,
    },

    /// Publish every valid draft schedule of a week
    PublishValid {
        /// Monday, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
    },

    /// Request a swap between two slots
    CreateSwap {
        #[arg(long)]
        requester: String,
        #[arg(long)]
        requester_slot: String,
        #[arg(long)]
        responder_slot: String,
    },

    /// Accept a pending swap (responder only)
    AcceptSwap {
        #[arg(long)]
        swap_id: String,
        #[arg(long)]
        responder: String,
    },

    /// Reject a pending swap (responder only)
    RejectSwap {
        #[arg(long)]
        swap_id: String,
        #[arg(long)]
        responder: String,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Expire overdue pending swaps
    ExpireSwaps,

    /// List schedules, optionally exporting one
    List {
        #[arg(long)]
        schedule_id: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Remove duplicate slot ranges left by past corruption
    FixDuplicates {
        #[arg(long)]
        team: Option<String>,
    },

    /// Generate a text reminder for a member's next shift
    Notify {
        #[arg(long)]
        handle: String,
        #[arg(long, default_value_t = 2)]
        days_before: i64,
        /// Output file (plain text)
        #[arg(long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.rota)?;
    let mut planner = match storage.load() {
        Ok(r) => Planner::from_rota(r),
        Err(_) => Planner::new(),
    };

    let code = match cli.cmd {
        Commands::AddMember {
            handle,
            display_name,
        } => {
            planner
                .rota_mut()
                .members
                .push(Member::new(handle, display_name));
            storage.save(planner.rota())?;
            0
        }
        Commands::ImportMembers { csv } => {
            let members = io::import_members_csv(csv)?;
            planner.rota_mut().members.extend(members);
            storage.save(planner.rota())?;
            0
        }
        Commands::AddTeam { name } => {
            let team = Team::new(name);
            println!("{}", team.id.as_str());
            planner.rota_mut().teams.push(team);
            storage.save(planner.rota())?;
            0
        }
        Commands::Configure {
            team,
            slot_duration_hours,
            min_break_hours,
        } => {
            let team_id = resolve_team(&planner, &team)?;
            let config =
                ScheduleConfig::new(slot_duration_hours, min_break_hours).map_err(|e| anyhow!(e))?;
            planner
                .rota_mut()
                .find_team_mut(&team_id)
                .ok_or_else(|| anyhow!("unknown team: {team}"))?
                .config = config;
            storage.save(planner.rota())?;
            0
        }
        Commands::Join {
            team,
            handle,
            regenerate_from,
        } => {
            let team_id = resolve_team(&planner, &team)?;
            let member_id = resolve_member(&planner, &handle)?;
            planner
                .rota_mut()
                .find_team_mut(&team_id)
                .ok_or_else(|| anyhow!("unknown team: {team}"))?
                .add_member(member_id);
            if let Some(from) = regenerate_from {
                let updated =
                    planner.regenerate_from_date(&team_id, from.parse()?, AssignPolicy::default())?;
                for week in &updated {
                    println!(
                        "regenerated week {}: {}/{} slots assigned",
                        week.week_start, week.assigned_count, week.slot_count
                    );
                }
            }
            storage.save(planner.rota())?;
            0
        }
        Commands::Leave {
            team,
            handle,
            regenerate_from,
        } => {
            let team_id = resolve_team(&planner, &team)?;
            let member_id = resolve_member(&planner, &handle)?;
            let found = planner
                .rota_mut()
                .find_team_mut(&team_id)
                .ok_or_else(|| anyhow!("unknown team: {team}"))?
                .set_member_active(&member_id, false);
            if !found {
                return Err(anyhow!("{handle} is not a member of {team}"));
            }
            if let Some(from) = regenerate_from {
                let updated =
                    planner.regenerate_from_date(&team_id, from.parse()?, AssignPolicy::default())?;
                for week in &updated {
                    println!(
                        "regenerated week {}: {}/{} slots assigned",
                        week.week_start, week.assigned_count, week.slot_count
                    );
                }
            }
            storage.save(planner.rota())?;
            0
        }
        Commands::Generate {
            team,
            week_start,
            publish,
            force_cover,
        } => {
            let team_id = resolve_team(&planner, &team)?;
            let policy = AssignPolicy { force_cover };
            let outcome =
                planner.generate_for_team_week(&team_id, week_start.parse()?, publish, policy)?;
            storage.save(planner.rota())?;
            println!("{}", outcome.schedule_id.as_str());
            print_validation(&outcome.validation);
            if outcome.validation.is_valid {
                0
            } else {
                2
            }
        }
        Commands::GenerateAll {
            week_start,
            publish,
        } => {
            let batch = planner.generate_for_all_teams(
                week_start.parse()?,
                publish,
                AssignPolicy::default(),
            )?;
            storage.save(planner.rota())?;
            for (name, outcome) in &batch.generated {
                println!("{name}: {}", outcome.schedule_id.as_str());
            }
            for (name, reason) in &batch.skipped {
                eprintln!("{name}: skipped ({reason})");
            }
            if batch.skipped.is_empty() {
                0
            } else {
                2
            }
        }
        Commands::Regenerate { team, from } => {
            let team_id = resolve_team(&planner, &team)?;
            let updated =
                planner.regenerate_from_date(&team_id, from.parse()?, AssignPolicy::default())?;
            storage.save(planner.rota())?;
            for week in &updated {
                println!(
                    "regenerated week {}: {}/{} slots assigned",
                    week.week_start, week.assigned_count, week.slot_count
                );
            }
            0
        }
        Commands::Validate { schedule_id } => {
            let report = planner.validate(&ScheduleId::new(schedule_id))?;
            storage.save(planner.rota())?;
            print_validation(&report);
            if report.is_valid {
                0
            } else {
                2
            }
        }
        Commands::Publish { schedule_id } => {
            planner.publish(&ScheduleId::new(schedule_id))?;
            storage.save(planner.rota())?;
            0
        }
        Commands::PublishValid { week_start } => {
            let published = planner.publish_valid(week_start.parse()?);
            storage.save(planner.rota())?;
            for id in &published {
                println!("{}", id.as_str());
            }
            0
        }
        Commands::CreateSwap {
            requester,
            requester_slot,
            responder_slot,
        } => {
            let requester_id = resolve_member(&planner, &requester)?;
            let request = planner.create_swap(
                &requester_id,
                &SlotId::new(requester_slot),
                &SlotId::new(responder_slot),
                Utc::now(),
            )?;
            storage.save(planner.rota())?;
            println!(
                "{} (deadline {})",
                request.id.as_str(),
                request.deadline.to_rfc3339()
            );
            0
        }
        Commands::AcceptSwap { swap_id, responder } => {
            let responder_id = resolve_member(&planner, &responder)?;
            planner.accept_swap(&SwapId::new(swap_id), &responder_id, Utc::now())?;
            storage.save(planner.rota())?;
            0
        }
        Commands::RejectSwap {
            swap_id,
            responder,
            reason,
        } => {
            let responder_id = resolve_member(&planner, &responder)?;
            planner.reject_swap(&SwapId::new(swap_id), &responder_id, &reason)?;
            storage.save(planner.rota())?;
            0
        }
        Commands::ExpireSwaps => {
            let expired = planner.expire_swaps(Utc::now());
            storage.save(planner.rota())?;
            println!("expired {} swap request(s)", expired.len());
            0
        }
        Commands::List {
            schedule_id,
            out_json,
            out_csv,
        } => {
            if let Some(path) = out_json {
                io::export_rota_json(path, planner.rota())?;
            }
            if let Some(id) = &schedule_id {
                let schedule = planner
                    .rota()
                    .find_schedule(&ScheduleId::new(id))
                    .ok_or_else(|| anyhow!("unknown schedule: {id}"))?;
                if let Some(path) = out_csv {
                    io::export_schedule_csv(path, planner.rota(), schedule)?;
                }
                for slot in &schedule.slots {
                    let assigned = slot
                        .assigned
                        .as_ref()
                        .and_then(|mid| planner.rota().find_member(mid))
                        .map(|m| m.handle.as_str())
                        .unwrap_or("-");
                    println!(
                        "{} | {} → {} | {}",
                        slot.id.as_str(),
                        slot.start.to_rfc3339(),
                        slot.end.to_rfc3339(),
                        assigned
                    );
                }
            } else {
                for schedule in &planner.rota().schedules {
                    let team = planner
                        .rota()
                        .find_team(&schedule.team)
                        .map(|t| t.name.as_str())
                        .unwrap_or("-");
                    println!(
                        "{} | {team} | week {} | {:?} | {} slots",
                        schedule.id.as_str(),
                        schedule.week_start,
                        schedule.status,
                        schedule.slots.len()
                    );
                }
            }
            0
        }
        Commands::FixDuplicates { team } => {
            let team_id = match team {
                Some(name) => Some(resolve_team(&planner, &name)?),
                None => None,
            };
            let removed = planner.cleanup_duplicate_slots(team_id.as_ref());
            storage.save(planner.rota())?;
            println!("removed {removed} duplicate slot(s)");
            0
        }
        Commands::Notify {
            handle,
            days_before,
            out,
        } => {
            let renderer = TextReminder;
            let reminder =
                prepare_reminder(planner.rota(), &handle, days_before, Utc::now(), &renderer)?;
            std::fs::write(&out, reminder.content)?;
            println!(
                "Reminder generated for {} (slot {}) at {}",
                reminder.member_handle,
                reminder.slot_id,
                reminder.notice_at.to_rfc3339()
            );
            0
        }
    };

    std::process::exit(code);
}

fn resolve_team(planner: &Planner, name: &str) -> Result<TeamId> {
    planner
        .rota()
        .find_team_by_name(name)
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow!("unknown team: {name}"))
}

fn resolve_member(planner: &Planner, handle: &str) -> Result<rotaplan::model::MemberId> {
    planner
        .rota()
        .find_member_by_handle(handle)
        .map(|m| m.id.clone())
        .ok_or_else(|| anyhow!("unknown member: {handle}"))
}

fn print_validation(report: &rotaplan::model::ValidationReport) {
    if report.is_valid {
        println!("OK: schedule is valid");
    } else {
        eprintln!("Schedule has {} error(s)", report.errors.len());
    }
    for err in &report.errors {
        eprintln!("error: {err}");
    }
    for warn in &report.warnings {
        eprintln!("warning: {warn}");
    }
}
