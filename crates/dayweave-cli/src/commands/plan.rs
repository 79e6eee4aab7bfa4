use clap::Args;
use dayweave_core::planner::{persist_event, schedule_event};
use dayweave_core::{
    Config, DayPlanner, JsonFileRepository, LineTaskExtractor, PlanRequest, ProposalRepository,
    TaskCandidate,
};
use std::path::PathBuf;

use super::CliResult;

#[derive(Args)]
pub struct PlanArgs {
    /// JSON file with calendar events
    #[arg(long)]
    events: Option<PathBuf>,
    /// JSON file with an array of task candidates
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    tasks: Option<PathBuf>,
    /// Text file with one task per line ("Breakfast 30m !high @morning")
    #[arg(long)]
    text: Option<PathBuf>,
    /// Day to plan (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<String>,
    /// Ignore free time before this time (HH:MM)
    #[arg(long)]
    from: Option<String>,
    /// Store the proposals
    #[arg(long)]
    save: bool,
}

pub fn run(args: PlanArgs) -> CliResult {
    let config = Config::load_or_default();
    let date = super::resolve_date(args.date.as_deref())?;
    let events = super::load_events(args.events.as_deref())?;
    let not_before = super::parse_minute(args.from.as_deref())?;

    let tasks: Vec<TaskCandidate> = match (&args.tasks, &args.text) {
        (Some(path), _) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        (None, Some(path)) => LineTaskExtractor::new().parse(&std::fs::read_to_string(path)?)?,
        (None, None) => return Err("either --tasks or --text is required".into()),
    };

    let rt = super::runtime()?;
    let repo = JsonFileRepository::open_default()?;
    let existing = rt.block_on(repo.list(date))?;

    let planner = DayPlanner::new(config.merge_settings()?, config.assigner_config());
    let request = PlanRequest::new(date)
        .with_events(events)
        .with_existing(existing)
        .with_tasks(tasks)
        .not_before(not_before);
    let result = planner.plan(&request)?;
    tracing::info!(event = ?schedule_event(&result), "plan finished");
    super::print_json(&result)?;

    if args.save {
        let report = rt.block_on(planner.persist(&result, &repo, &config.retry_policy()?));
        tracing::info!(event = ?persist_event(date, &report), "proposals stored");
        eprintln!("saved {} proposal(s)", report.saved.len());
        if !report.is_complete() {
            for failed in &report.failed {
                eprintln!("  {}: {}", failed.proposal_id, failed.error);
            }
            return Err(format!("{} proposal(s) could not be saved", report.failed.len()).into());
        }
    }
    Ok(())
}
