use clap::Args;
use dayweave_core::{Config, DayPlanner, PlanRequest, ProposalRepository};
use std::path::PathBuf;

use super::CliResult;

#[derive(Args)]
pub struct SlotsArgs {
    /// JSON file with calendar events
    #[arg(long)]
    events: Option<PathBuf>,
    /// Day to inspect (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<String>,
    /// Ignore free time before this time (HH:MM)
    #[arg(long)]
    from: Option<String>,
    /// Do not count stored proposals as busy
    #[arg(long)]
    ignore_proposals: bool,
}

pub fn run(args: SlotsArgs) -> CliResult {
    let config = Config::load_or_default();
    let date = super::resolve_date(args.date.as_deref())?;
    let events = super::load_events(args.events.as_deref())?;
    let not_before = super::parse_minute(args.from.as_deref())?;

    let existing = if args.ignore_proposals {
        Vec::new()
    } else {
        let repo = dayweave_core::JsonFileRepository::open_default()?;
        super::runtime()?.block_on(repo.list(date))?
    };

    let planner = DayPlanner::new(config.merge_settings()?, config.assigner_config());
    let request = PlanRequest::new(date)
        .with_events(events)
        .with_existing(existing)
        .not_before(not_before);

    let report = planner.free_slots(&request);
    eprintln!(
        "{} free minute(s) in {} slot(s)",
        report.total_free_minutes(),
        report.slots.len()
    );
    super::print_json(&report)
}
