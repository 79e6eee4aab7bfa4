use clap::Args;
use dayweave_core::{Config, DayBoard, JsonFileRepository, ProposalRepository};
use std::path::PathBuf;

use super::CliResult;

#[derive(Args)]
pub struct LayoutArgs {
    /// JSON file with calendar events
    #[arg(long)]
    events: Option<PathBuf>,
    /// Day to lay out (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<String>,
}

pub fn run(args: LayoutArgs) -> CliResult {
    let config = Config::load_or_default();
    let date = super::resolve_date(args.date.as_deref())?;
    let events = super::load_events(args.events.as_deref())?;

    let repo = JsonFileRepository::open_default()?;
    let proposals = super::runtime()?.block_on(repo.list(date))?;

    let board = DayBoard::from_events(
        date,
        &events,
        proposals,
        config.layout_config()?,
        config.drag_config()?,
    );
    super::print_json(board.display_items())
}
