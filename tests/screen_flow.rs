//! End-to-end tests for the download button
//!
//! These drive the public API with the in-memory subsystem: taps, status
//! changes arriving through the monitor queue, and frames sampled at chosen
//! instants.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use loadapp::button::{
    AnimatedRenderer, ButtonState, ButtonStateMachine, ButtonStyle, DrawCommand,
    FixedAdvanceMeasurer, Transition,
};
use loadapp::config::AppConfig;
use loadapp::detail::{DetailView, UNKNOWN};
use loadapp::download::{
    ChangeSignal, DownloadMonitor, DownloadRequest, DownloadStatus, InMemorySubsystem, PollOutcome,
};
use loadapp::notify::TerminalNotifier;
use loadapp::screen::{MainScreen, TapOutcome};

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    subsystem: Arc<InMemorySubsystem>,
    machine: Rc<RefCell<ButtonStateMachine>>,
    monitor: DownloadMonitor<Arc<InMemorySubsystem>>,
    transitions: Rc<RefCell<Vec<Transition>>>,
}

fn harness() -> Harness {
    let subsystem = Arc::new(InMemorySubsystem::new());
    let machine = Rc::new(RefCell::new(ButtonStateMachine::new()));
    let transitions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&transitions);
    machine
        .borrow_mut()
        .subscribe(move |t: &Transition| sink.borrow_mut().push(t.clone()));
    let monitor = DownloadMonitor::new(Arc::clone(&subsystem), Rc::clone(&machine));
    Harness {
        subsystem,
        machine,
        monitor,
        transitions,
    }
}

fn states(transitions: &Rc<RefCell<Vec<Transition>>>) -> Vec<ButtonState> {
    transitions.borrow().iter().map(|t| t.to).collect()
}

// =============================================================================
// Monitor scenarios
// =============================================================================

#[test]
fn test_running_then_succeeded_emits_one_completion() {
    let mut h = harness();
    let id = h
        .monitor
        .start(DownloadRequest::new("https://example.com/a.zip", "t"))
        .unwrap();

    h.subsystem.set_status(id, DownloadStatus::Running);
    h.monitor.drain();
    assert_eq!(h.machine.borrow().current(), ButtonState::InProgress);

    h.subsystem.set_status(id, DownloadStatus::Succeeded);
    // A duplicate terminal notification.
    h.subsystem.notify_observers();
    let completed: Vec<_> = h
        .monitor
        .drain()
        .into_iter()
        .filter_map(|o| match o {
            PollOutcome::Completed(event) => Some(event),
            _ => None,
        })
        .collect();

    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, DownloadStatus::Succeeded);
    assert_eq!(completed[0].file_label, "t");
    assert_eq!(h.subsystem.observer_count(), 0);
    assert_eq!(
        states(&h.transitions),
        vec![ButtonState::Clicked, ButtonState::InProgress, ButtonState::Completed]
    );
}

#[test]
fn test_repeated_progress_never_revisits_clicked() {
    let mut h = harness();
    let id = h
        .monitor
        .start(DownloadRequest::new("https://example.com/a.zip", "t"))
        .unwrap();

    for status in [
        DownloadStatus::Pending,
        DownloadStatus::Running,
        DownloadStatus::Running,
        DownloadStatus::Pending,
        DownloadStatus::Running,
    ] {
        h.subsystem.set_status(id, status);
        h.monitor.drain();
        assert_eq!(h.machine.borrow().current(), ButtonState::InProgress);
    }
    assert_eq!(
        states(&h.transitions),
        vec![ButtonState::Clicked, ButtonState::InProgress]
    );
}

#[test]
fn test_missing_row_keeps_session() {
    let mut h = harness();
    let id = h
        .monitor
        .start(DownloadRequest::new("https://example.com/a.zip", "t"))
        .unwrap();
    h.subsystem.forget(id);

    assert_eq!(
        h.monitor.on_change(ChangeSignal { request_id: id }),
        PollOutcome::NotFound
    );
    assert!(h.monitor.is_active());
    assert_eq!(states(&h.transitions), vec![ButtonState::Clicked]);
}

#[test]
fn test_restart_ignores_old_request() {
    let mut h = harness();
    let first = h
        .monitor
        .start(DownloadRequest::new("https://example.com/a.zip", "a"))
        .unwrap();
    let second = h
        .monitor
        .start(DownloadRequest::new("https://example.com/b.zip", "b"))
        .unwrap();

    // The first request's row is gone; late signals for it change nothing.
    h.subsystem.set_status(first, DownloadStatus::Succeeded);
    assert_eq!(
        h.monitor.on_change(ChangeSignal { request_id: first }),
        PollOutcome::Stale
    );
    assert_eq!(h.monitor.session().request_id, Some(second));
    assert_eq!(h.subsystem.observer_count(), 1);
    assert_eq!(h.machine.borrow().current(), ButtonState::Clicked);
}

// =============================================================================
// Renderer and clock
// =============================================================================

#[test]
fn test_renderer_animates_only_while_in_progress() {
    let machine = Rc::new(RefCell::new(ButtonStateMachine::new()));
    let cycle = Duration::from_millis(1000);
    let mut renderer = AnimatedRenderer::new(
        Rc::clone(&machine),
        ButtonStyle::default(),
        cycle,
        Box::new(FixedAdvanceMeasurer::default()),
    );
    renderer.resize(1000.0, 100.0);

    let start = Instant::now();
    machine.borrow_mut().transition_at(ButtonState::Clicked, start);
    assert!(renderer.sample(start).is_none());

    machine.borrow_mut().transition_at(ButtonState::InProgress, start);
    let quarter = renderer.sample(start + cycle / 4).unwrap();
    let again = renderer.sample(start + cycle / 4 + cycle).unwrap();
    assert_eq!(quarter, again);
    assert!((quarter.sweep_angle_degrees - 90.0).abs() < 0.5);

    let frame = renderer.render(start + cycle / 4);
    assert!(frame
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Arc { .. })));

    machine.borrow_mut().transition(ButtonState::Completed);
    assert!(!renderer.is_animating());
    let frame = renderer.render(start + cycle);
    assert!(!frame
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Arc { .. })));
}

// =============================================================================
// Screen
// =============================================================================

#[test]
fn test_screen_full_cycle() {
    let subsystem = Arc::new(InMemorySubsystem::new());
    let mut screen = MainScreen::new(
        AppConfig::default(),
        Arc::clone(&subsystem),
        TerminalNotifier::new(Vec::new()),
        Box::new(FixedAdvanceMeasurer::default()),
    );

    let TapOutcome::Started(id) = screen.on_tap(Some("glide")).unwrap() else {
        panic!("expected the tap to start a download");
    };
    subsystem.set_status(id, DownloadStatus::Running);
    screen.pump();
    assert_eq!(screen.on_tap(Some("glide")).unwrap(), TapOutcome::Ignored);

    subsystem.set_status(id, DownloadStatus::Succeeded);
    screen.pump();
    assert_eq!(screen.machine().borrow().current(), ButtonState::Completed);

    let notification = &screen.notifier().pending()[0];
    assert!(notification.body_text.starts_with("Download complete for Glide"));
    let detail = DetailView::from_target(&notification.action_target);
    assert_eq!(detail.status_text(), "Successful");

    // Completed accepts a new tap.
    assert!(matches!(
        screen.on_tap(Some("retrofit")).unwrap(),
        TapOutcome::Started(_)
    ));
}

#[test]
fn test_completed_frame_shows_start_label_without_arc() {
    let subsystem = Arc::new(InMemorySubsystem::new());
    let mut screen = MainScreen::new(
        AppConfig::default(),
        Arc::clone(&subsystem),
        TerminalNotifier::new(Vec::new()),
        Box::new(FixedAdvanceMeasurer::default()),
    );
    screen.resize(400.0, 60.0);

    let TapOutcome::Started(id) = screen.on_tap(Some("glide")).unwrap() else {
        panic!("expected the tap to start a download");
    };
    subsystem.set_status(id, DownloadStatus::Running);
    screen.pump();
    let busy = screen.on_frame(Instant::now());
    assert!(busy
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Arc { .. })));

    subsystem.set_status(id, DownloadStatus::Succeeded);
    screen.pump();
    let done = screen.on_frame(Instant::now());
    assert!(!done
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Arc { .. })));
    assert!(done
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Download")));
}

#[test]
fn test_detail_without_extras() {
    let view = DetailView::new(None, None);
    assert_eq!(view.file_label(), UNKNOWN);
    assert_eq!(view.status_text(), UNKNOWN);
}

#[tokio::test]
async fn test_signals_from_background_task() {
    let subsystem = Arc::new(InMemorySubsystem::new());
    let mut screen = MainScreen::new(
        AppConfig::default(),
        Arc::clone(&subsystem),
        TerminalNotifier::new(Vec::new()),
        Box::new(FixedAdvanceMeasurer::default()),
    );
    let TapOutcome::Started(id) = screen.on_tap(Some("udacity")).unwrap() else {
        panic!("expected the tap to start a download");
    };

    let remote = Arc::clone(&subsystem);
    tokio::spawn(async move {
        remote.set_status(id, DownloadStatus::Running);
        remote.set_status(id, DownloadStatus::Failed);
    });

    let mut completed = None;
    while completed.is_none() {
        let signal = screen.monitor_mut().next_signal().await.unwrap();
        if let PollOutcome::Completed(event) = screen.on_signal(signal) {
            completed = Some(event);
        }
    }
    assert_eq!(completed.unwrap().status, DownloadStatus::Failed);
    assert_eq!(screen.detail().status_text(), "Failed");
}
