//! Integration tests for drag rescheduling on a full day board.

use chrono::NaiveDate;
use dayweave_core::{
    CalendarEvent, DayBoard, DragConfig, DragOutcome, DragPhase, Event, InMemoryRepository,
    JsonFileRepository, LayoutConfig, Point, Proposal, ProposalRepository, RetryPolicy, TimeValue,
};
use std::time::Duration;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn events() -> Vec<CalendarEvent> {
    vec![CalendarEvent::new(
        "standup",
        "Standup",
        TimeValue::parse("09:00").unwrap(),
        TimeValue::parse("09:15").unwrap(),
    )]
}

fn proposal(id: &str, start: u32, end: u32) -> Proposal {
    Proposal::manual(id, id, date(), start, end).unwrap()
}

fn board(proposals: Vec<Proposal>) -> DayBoard {
    DayBoard::from_events(
        date(),
        &events(),
        proposals,
        LayoutConfig::default(),
        DragConfig::default(),
    )
}

fn drag(board: &mut DayBoard, pointer: u32, id: &str, dy: f64) -> DragOutcome {
    let top = board.item(id).unwrap().top;
    board.pointer_down(pointer, id, Point::new(10.0, top));
    board.pointer_move(pointer, Point::new(10.0, top + dy));
    board.pointer_up(pointer, Point::new(10.0, top + dy))
}

#[tokio::test]
async fn test_drag_commits_and_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("proposals.json"));
    repo.create(&proposal("focus", 540, 570)).await.unwrap();

    let mut board = board(repo.list(date()).await.unwrap());
    assert!(matches!(drag(&mut board, 1, "focus", 47.0), DragOutcome::Dropped(_)));

    let event = board
        .confirm(&repo, &RetryPolicy::default())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        event,
        Event::DragCommitted { new_start: 585, new_end: 615, .. }
    ));

    let reloaded = repo.list(date()).await.unwrap();
    assert_eq!((reloaded[0].assigned_start, reloaded[0].assigned_end), (585, 615));

    let item = board.item("focus").unwrap();
    assert_eq!(item.top, 585.0);
    assert_eq!(item.column_count, 1);
}

#[tokio::test]
async fn test_offline_repository_rolls_back_after_retries() {
    let repo = InMemoryRepository::with_proposals([proposal("focus", 540, 570)]);
    repo.set_offline(true);
    let policy = RetryPolicy {
        max_attempts: 2,
        timeout: Duration::from_millis(20),
        backoff: Duration::from_millis(5),
    };

    let mut board = board(vec![proposal("focus", 540, 570)]);
    let before = board.item("focus").unwrap().clone();
    drag(&mut board, 1, "focus", 47.0);
    assert_eq!(board.item("focus").unwrap().start, 585);

    let rollback = board.confirm(&repo, &policy).await.unwrap_err();
    assert!(rollback.to_string().contains("focus"));
    assert_eq!(board.item("focus").unwrap(), &before);

    let stored = board.store().get("focus").unwrap();
    assert_eq!((stored.assigned_start, stored.assigned_end), (540, 570));
    assert_eq!(repo.snapshot()[0].assigned_start, 540);

    let events = board.drain_events();
    assert!(matches!(
        events.last(),
        Some(Event::DragRolledBack { restored_start: 540, restored_end: 570, .. })
    ));
}

#[test]
fn test_second_pointer_is_ignored_while_dragging() {
    let mut board = board(vec![proposal("a", 600, 630), proposal("b", 700, 730)]);
    let top = board.item("a").unwrap().top;
    board.pointer_down(1, "a", Point::new(0.0, top));
    board.pointer_move(1, Point::new(0.0, top + 30.0));
    assert_eq!(board.drag_phase(), DragPhase::Dragging);

    let b_top = board.item("b").unwrap().top;
    assert_eq!(board.pointer_down(2, "b", Point::new(0.0, b_top)), DragOutcome::Ignored);
    assert_eq!(board.pointer_up(2, Point::new(0.0, b_top + 40.0)), DragOutcome::Ignored);

    assert!(matches!(board.pointer_cancel(1), DragOutcome::Cancelled { .. }));
    assert_eq!(board.store().get("a").unwrap().assigned_start, 600);
    assert_eq!(board.store().get("b").unwrap().assigned_start, 700);
}

#[test]
fn test_drag_clamps_to_end_of_day() {
    let mut board = board(vec![proposal("late", 1380, 1410)]);
    drag(&mut board, 1, "late", 300.0);

    let stored = board.store().get("late").unwrap();
    assert_eq!((stored.assigned_start, stored.assigned_end), (1410, 1440));
}

#[test]
fn test_overlapping_proposal_shares_columns_with_event() {
    let board = board(vec![proposal("p", 540, 600)]);
    let event = board.item("standup").unwrap();
    let item = board.item("p").unwrap();

    assert_eq!(event.column_count, 2);
    assert_eq!(item.column_count, 2);
    assert_ne!(event.column_index, item.column_index);
    assert_eq!(item.width, 50.0);
}
