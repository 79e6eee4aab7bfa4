use clap::Args;
use dayweave_core::{Config, DayBoard, DragOutcome, JsonFileRepository, Point, ProposalRepository};
use std::path::PathBuf;

use super::CliResult;

const POINTER: u32 = 1;

#[derive(Args)]
pub struct MoveArgs {
    /// Proposal id
    id: String,
    /// Minutes to move by (negative moves earlier)
    #[arg(long, allow_negative_numbers = true)]
    by: i32,
    /// JSON file with calendar events
    #[arg(long)]
    events: Option<PathBuf>,
    /// Day the proposal is on (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<String>,
}

/// Replays the gesture a pointer would make: press on the item, move by the
/// offset, release, then confirm against the proposal file.
pub fn run(args: MoveArgs) -> CliResult {
    let config = Config::load_or_default();
    let date = super::resolve_date(args.date.as_deref())?;
    let events = super::load_events(args.events.as_deref())?;
    let drag = config.drag_config()?;

    let rt = super::runtime()?;
    let repo = JsonFileRepository::open_default()?;
    let proposals = rt.block_on(repo.list(date))?;

    let mut board = DayBoard::from_events(date, &events, proposals, config.layout_config()?, drag);
    let Some(item) = board.item(&args.id) else {
        return Err(format!("no proposal '{}' on {date}", args.id).into());
    };

    let from = Point::new(0.0, item.top);
    let to = Point::new(0.0, item.top + f64::from(args.by) * drag.pixels_per_minute);

    if board.pointer_down(POINTER, &args.id, from) == DragOutcome::Ignored {
        return Err(format!("'{}' cannot be moved", args.id).into());
    }
    board.pointer_move(POINTER, to);
    match board.pointer_up(POINTER, to) {
        DragOutcome::Dropped(_) => {}
        DragOutcome::Clicked { .. } => {
            return Err(format!(
                "a move of {} minute(s) is below the drag threshold",
                args.by
            )
            .into());
        }
        other => return Err(format!("move did not complete: {other:?}").into()),
    }

    match rt.block_on(board.confirm(&repo, &config.retry_policy()?))? {
        Some(event) => super::print_json(&event),
        None => Err("move did not complete".into()),
    }
}
