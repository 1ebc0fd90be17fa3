//! Controller behaviour against an instrumented store, on a paused clock

use board_core::widgets::{ideas, performance};
use board_core::{
    BoardConfig, BoardError, ControllerState, DashboardController, Notice, Phase, SelectOutcome,
    WidgetContract, WidgetError,
};
use board_model::{ErrorKind, IdeaAction, TeamPatch};
use board_test_utils::{default_doc, team, RecordingStore};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn controller(store: &Arc<RecordingStore>) -> DashboardController {
    DashboardController::new(store.clone(), BoardConfig::local())
}

fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}

fn ready(outcome: SelectOutcome) -> board_model::TeamDocument {
    match outcome {
        SelectOutcome::Ready(doc) => doc,
        SelectOutcome::Superseded => panic!("select was superseded"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_new_team_gets_persisted_defaults() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);

    let doc = ready(board.select(team("PUD")).await.unwrap());
    assert_eq!(doc.kpis().len(), 2);
    assert_eq!(doc.performance_layout().label, "2 × 4");
    assert_eq!(doc.ideas_actions().len(), 1);

    // Persisted immediately, not after the debounce window.
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.stored(&team("PUD")).await, Some(doc.clone()));

    let before = Utc::now();
    let mut rows = doc.ideas_actions();
    rows.push(IdeaAction::default());
    let patched = board
        .patch(TeamPatch::new().ideas_actions(rows))
        .await
        .unwrap();
    assert_eq!(patched.ideas_actions().len(), 2);
    assert!(patched.last_updated.unwrap() >= before);
    assert_eq!(patched.created_at, doc.created_at);
}

#[tokio::test(start_paused = true)]
async fn test_existing_document_is_loaded_not_replaced() {
    let store = Arc::new(RecordingStore::new());
    let mut stored = default_doc("WTH");
    stored.team_news = Some("Forklift training Friday".into());
    store.seed(&team("WTH"), stored.clone()).await;

    let board = controller(&store);
    let doc = ready(board.select(team("WTH")).await.unwrap());
    assert_eq!(doc, stored);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_into_one_write() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();
    let mut notices = board.subscribe_notices();

    board.patch(TeamPatch::new().team_news("one")).await.unwrap();
    board.patch(TeamPatch::new().show_news(false)).await.unwrap();
    board.patch(TeamPatch::new().team_news("three")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(store.save_count(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let saves = store.saves_for(&team("PUD"));
    assert_eq!(saves.len(), 2);
    let written = &saves[1];
    assert_eq!(written.team_news(), "three");
    assert!(!written.show_news());
    assert_eq!(Some(written.clone()), board.document());
    assert!(drain(&mut notices).contains(&Notice::Persisted { team: team("PUD") }));
}

#[tokio::test(start_paused = true)]
async fn test_new_patch_restarts_window() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();

    board.patch(TeamPatch::new().safety_text("a")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    board.patch(TeamPatch::new().safety_text("b")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.save_count(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.save_count(), 2);
    assert_eq!(store.stored(&team("PUD")).await.unwrap().safety_text(), "b");
}

#[tokio::test(start_paused = true)]
async fn test_team_switch_flushes_to_captured_team() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();
    board.patch(TeamPatch::new().team_news("pud only")).await.unwrap();

    let wth = ready(board.select(team("WTH")).await.unwrap());
    assert_eq!(wth.team_news(), "");
    assert_eq!(
        store.stored(&team("PUD")).await.unwrap().team_news(),
        "pud only"
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.saves_for(&team("PUD")).len(), 2);
    assert_eq!(store.stored(&team("WTH")).await.unwrap().team_news(), "");
}

#[tokio::test(start_paused = true)]
async fn test_stale_load_is_discarded() {
    let store = Arc::new(RecordingStore::new());
    let mut slow = default_doc("WTH");
    slow.team_news = Some("slow".into());
    store.seed(&team("WTH"), slow).await;
    store.set_load_delay(&team("WTH"), Duration::from_secs(1));

    let board = controller(&store);
    let first = {
        let board = board.clone();
        tokio::spawn(async move { board.select(team("WTH")).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(board.state(), ControllerState::Loading(team("WTH")));

    let spv = ready(board.select(team("SPV")).await.unwrap());
    assert_eq!(first.await.unwrap().unwrap(), SelectOutcome::Superseded);
    assert_eq!(board.team(), Some(team("SPV")));
    assert_eq!(board.document(), Some(spv));
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_keeps_memory_authoritative() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();
    let mut notices = board.subscribe_notices();

    store.fail_saves_for(&team("PUD"));
    board.patch(TeamPatch::new().news_text("kept")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(board.state().phase(), Phase::Ready);
    assert_eq!(board.document().unwrap().news_text(), "kept");
    let failed = drain(&mut notices)
        .into_iter()
        .find_map(|n| match n {
            Notice::PersistFailed { kind, .. } => Some(kind),
            _ => None,
        });
    assert_eq!(failed, Some(ErrorKind::PersistenceWriteFailed));
}

#[tokio::test(start_paused = true)]
async fn test_default_persist_failure_still_becomes_ready() {
    let store = Arc::new(RecordingStore::new());
    store.fail_every_save(true);
    let board = controller(&store);
    let mut notices = board.subscribe_notices();

    let doc = ready(board.select(team("SPV")).await.unwrap());
    assert_eq!(doc.kpis().len(), 2);
    assert!(drain(&mut notices)
        .iter()
        .any(|n| matches!(n, Notice::PersistFailed { team: t, .. } if *t == team("SPV"))));
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_is_error_state_without_retry() {
    let store = Arc::new(RecordingStore::new());
    store.fail_loads_for(&team("SPV"));
    let board = controller(&store);

    let err = board.select(team("SPV")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::PersistenceReadFailed));
    match board.state() {
        ControllerState::Error { team: t, reason } => {
            assert_eq!(t, team("SPV"));
            assert!(reason.contains("injected read failure"));
        }
        other => panic!("expected error state, got {other:?}"),
    }
    assert!(matches!(
        board.patch(TeamPatch::new().team_news("x")).await,
        Err(BoardError::NotReady { phase: Phase::Error })
    ));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.loads().len(), 1);

    store.clear_failures();
    assert!(matches!(
        board.select(team("SPV")).await.unwrap(),
        SelectOutcome::Ready(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_patch_before_select_is_rejected() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    assert!(matches!(
        board.patch(TeamPatch::new().team_news("x")).await,
        Err(BoardError::NotReady {
            phase: Phase::Uninitialized
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_widget_operations_run_against_latest_document() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();

    board.update_with(|doc| Ok(ideas::add_row(doc))).await.unwrap();
    board
        .update_with(|doc| ideas::edit_field(doc, 1, ideas::IdeaField::Who, "Ben"))
        .await
        .unwrap();
    let doc = board.update_with(|doc| ideas::delete_row(doc, 0)).await.unwrap();
    assert_eq!(doc.ideas_actions().len(), 1);
    assert_eq!(doc.ideas_actions()[0].who, "Ben");

    let err = board
        .update_with(|doc| performance::delete_kpi(doc, 9))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::Widget(WidgetError::IndexOutOfRange { index: 9, len: 2 })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_empty_patch_is_noop() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    let doc = ready(board.select(team("PUD")).await.unwrap());

    let same = board
        .update_with(|doc| Ok(performance::move_kpi(doc, 0, board_core::Direction::Up)))
        .await
        .unwrap();
    assert_eq!(same.last_updated, doc.last_updated);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_widget_contract_surface() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    let widget: &dyn WidgetContract = &board;
    assert!(widget.dashboard_data().is_none());

    board.select(team("Team4")).await.unwrap();
    let doc = widget
        .update_dashboard_data(TeamPatch::new().show_safety(false))
        .await
        .unwrap();
    assert!(!doc.show_safety());
    assert_eq!(widget.dashboard_data(), Some(doc));
}

#[tokio::test(start_paused = true)]
async fn test_dispose_flushes_pending_write() {
    let store = Arc::new(RecordingStore::new());
    let board = controller(&store);
    board.select(team("PUD")).await.unwrap();
    board.patch(TeamPatch::new().team_news("bye")).await.unwrap();

    board.dispose().await;
    assert_eq!(board.state(), ControllerState::Uninitialized);
    assert_eq!(store.stored(&team("PUD")).await.unwrap().team_news(), "bye");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_selects_configured_team() {
    let store = Arc::new(RecordingStore::new());
    let config = BoardConfig::local().with_default_team(team("SPV"));
    let board = DashboardController::new(store.clone(), config);
    let mut states = board.watch();

    board.start().await.unwrap();
    assert_eq!(board.team(), Some(team("SPV")));
    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().phase(), Phase::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_mode_writes_every_patch() {
    let store = Arc::new(RecordingStore::new());
    let board = DashboardController::new(store.clone(), BoardConfig::remote());
    board.select(team("PUD")).await.unwrap();

    board.patch(TeamPatch::new().team_news("a")).await.unwrap();
    board.patch(TeamPatch::new().team_news("b")).await.unwrap();
    assert_eq!(store.save_count(), 3);
    assert_eq!(store.stored(&team("PUD")).await.unwrap().team_news(), "b");
}
