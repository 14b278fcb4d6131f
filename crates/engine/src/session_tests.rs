//! Tests for `RoadmapSession` against the in-memory store double.
//!
//! `#[tokio::test]` runs on a current-thread runtime, so the writer task
//! only makes progress when a test awaits.  `shutdown()` drains the queue
//! before assertions on what reached the store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use store::mock::MemoryStore;
use store::{
    NodePositions, Position, RoadmapState, RoadmapStore, StepStatus, StepStatusMap, StoreError,
};
use uuid::Uuid;

use crate::layout::LayoutMode;
use crate::models::{GraphMode, RoadmapStep};
use crate::session::{NoopObserver, RoadmapSession, SessionConfig, SessionInput, SessionObserver};
use crate::EngineError;

fn fork() -> Vec<RoadmapStep> {
    vec![
        RoadmapStep::new("0", "A"),
        RoadmapStep::new("1", "B").depends_on(["0"]),
        RoadmapStep::new("2", "C").depends_on(["0"]),
    ]
}

fn linear(n: usize) -> Vec<RoadmapStep> {
    (0..n)
        .map(|i| RoadmapStep::new(i.to_string(), format!("step {i}")))
        .collect()
}

fn status(entries: &[(&str, StepStatus)]) -> StepStatusMap {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

async fn open_with(
    input: SessionInput,
    store: &MemoryStore,
    observer: Arc<dyn SessionObserver>,
) -> RoadmapSession {
    let store: Arc<dyn RoadmapStore> = Arc::new(store.clone());
    RoadmapSession::open(input, Some(store), observer, SessionConfig::default()).await
}

/// Records every callback as a short string.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_status_change(&self, step_id: &str, status: StepStatus) {
        self.events.lock().unwrap().push(format!("status {step_id} {status}"));
    }

    fn on_positions_change(&self, positions: &NodePositions) {
        self.events.lock().unwrap().push(format!("positions {}", positions.len()));
    }

    fn on_node_click(&self, step: &RoadmapStep) {
        self.events.lock().unwrap().push(format!("click {}", step.title));
    }
}

// ============================================================
// Mounting
// ============================================================

#[tokio::test]
async fn unsaved_roadmap_never_touches_the_store() {
    let store = MemoryStore::new();
    let mut session = open_with(SessionInput::new(linear(3)), &store, Arc::new(NoopObserver)).await;

    assert_eq!(session.mode(), GraphMode::Linear);
    assert_eq!(session.layout_mode(), LayoutMode::Auto);
    assert_eq!(session.status_map().len(), 3);

    session.advance("1").unwrap();
    assert_eq!(session.status_of("1"), StepStatus::InProgress);
    assert!(session.drag("1", Position::new(5.0, 5.0)).is_ok());
    assert!(session.end_drag());
    assert_eq!(session.pending_writes(), 0);

    session.shutdown().await;
    assert_eq!(store.load_count(), 0);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn saved_state_is_restored_and_missing_statuses_written_back() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    let mut positions = NodePositions::new();
    positions.insert("0".into(), Position::new(10.0, 20.0));
    store.insert(
        id,
        RoadmapState {
            positions,
            status: status(&[("0", StepStatus::Completed), ("old", StepStatus::InProgress)]),
        },
    );

    let session = open_with(
        SessionInput::new(fork()).with_roadmap_id(id),
        &store,
        Arc::new(NoopObserver),
    )
    .await;

    // Partial restore: no auto-layout for the unlisted nodes.
    assert_eq!(session.layout_mode(), LayoutMode::Restored);
    assert_eq!(session.node("0").unwrap().position, Position::new(10.0, 20.0));
    assert_eq!(session.node("1").unwrap().position, Position::default());
    assert_eq!(session.node("2").unwrap().position, Position::default());

    assert_eq!(session.status_of("0"), StepStatus::Completed);
    assert_eq!(session.progress(), 33);
    assert!(!session.edges().iter().any(|e| e.visual.animated));
    assert!(session.is_saving());

    session.shutdown().await;

    let written = store.status_writes();
    assert_eq!(written.len(), 1);
    assert_eq!(
        written[0],
        status(&[
            ("0", StepStatus::Completed),
            ("1", StepStatus::Pending),
            ("2", StepStatus::Pending),
            ("old", StepStatus::InProgress),
        ])
    );
}

#[tokio::test]
async fn fully_initialised_state_is_not_written_back() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.insert(
        id,
        RoadmapState {
            positions: NodePositions::new(),
            status: status(&[("0", StepStatus::Pending), ("1", StepStatus::Pending)]),
        },
    );

    let session = open_with(
        SessionInput::new(linear(2)).with_roadmap_id(id),
        &store,
        Arc::new(NoopObserver),
    )
    .await;
    assert!(!session.is_saving());

    session.shutdown().await;
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn failed_load_falls_back_to_host_values_without_writing() {
    let store = MemoryStore::failing_loads("timeout");
    let id = Uuid::new_v4();

    let session = open_with(
        SessionInput::new(fork())
            .with_roadmap_id(id)
            .with_status(status(&[("2", StepStatus::InProgress)])),
        &store,
        Arc::new(NoopObserver),
    )
    .await;

    assert_eq!(store.load_count(), 1);
    assert_eq!(session.layout_mode(), LayoutMode::Auto);
    assert_eq!(session.status_of("2"), StepStatus::InProgress);
    assert_eq!(session.status_of("0"), StepStatus::Pending);

    // Rank 1 holds both children below the root.
    let root = session.node("0").unwrap().position;
    let left = session.node("1").unwrap().position;
    let right = session.node("2").unwrap().position;
    assert_eq!(left.y, right.y);
    assert!(left.y > root.y);

    session.shutdown().await;
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn unknown_roadmap_is_treated_as_fresh() {
    let store = MemoryStore::new();
    let session = open_with(
        SessionInput::new(linear(2)).with_roadmap_id(Uuid::new_v4()),
        &store,
        Arc::new(NoopObserver),
    )
    .await;

    assert_eq!(session.progress(), 0);
    session.shutdown().await;
    assert!(store.writes().is_empty());
}

// ============================================================
// Status tracking
// ============================================================

#[tokio::test]
async fn every_status_change_persists_the_full_map_in_order() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.insert(id, RoadmapState::default());
    let observer = Arc::new(RecordingObserver::default());

    let mut session = open_with(
        SessionInput::new(linear(2)).with_roadmap_id(id),
        &store,
        observer.clone(),
    )
    .await;
    // Let the initial write-back land on its own.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert_eq!(session.advance("0").unwrap(), StepStatus::InProgress);
    tokio::task::yield_now().await;
    assert_eq!(session.advance("0").unwrap(), StepStatus::Completed);
    session.set_status("1", StepStatus::InProgress).unwrap();

    let expected = status(&[("0", StepStatus::Completed), ("1", StepStatus::InProgress)]);
    assert_eq!(session.status_map(), &expected);
    assert_eq!(session.progress(), 50);

    session.shutdown().await;

    let written = store.status_writes();
    assert_eq!(written.last(), Some(&expected));
    assert_eq!(store.state(id).unwrap().status, expected);
    // Every payload carries every step.
    assert!(written.iter().all(|w| w.len() == 2));

    assert_eq!(
        observer.events(),
        vec![
            "status 0 in-progress",
            "status 0 completed",
            "status 1 in-progress",
        ]
    );
}

#[tokio::test]
async fn three_advances_cycle_back_to_pending() {
    let store = MemoryStore::new();
    let mut session = open_with(SessionInput::new(linear(1)), &store, Arc::new(NoopObserver)).await;

    for _ in 0..3 {
        session.advance("0").unwrap();
    }
    assert_eq!(session.status_of("0"), StepStatus::Pending);
    assert_eq!(session.node("0").unwrap().status, StepStatus::Pending);
}

#[tokio::test]
async fn all_edges_follow_their_source_after_each_change() {
    let store = MemoryStore::new();
    let mut session = open_with(SessionInput::new(linear(4)), &store, Arc::new(NoopObserver)).await;
    assert!(session.edges().iter().all(|e| e.visual.animated));

    session.set_status("1", StepStatus::Completed).unwrap();
    let animated: Vec<bool> = session.edges().iter().map(|e| e.visual.animated).collect();
    assert_eq!(animated, vec![true, false, true]);

    session.set_status("1", StepStatus::InProgress).unwrap();
    assert!(session.edges().iter().all(|e| e.visual.animated));
    assert_eq!(session.graph().progress, 0);
}

#[tokio::test]
async fn failed_save_keeps_the_optimistic_state() {
    let store = MemoryStore::failing_writes("503");
    let id = Uuid::new_v4();

    let mut session = open_with(
        SessionInput::new(linear(2)).with_roadmap_id(id),
        &store,
        Arc::new(NoopObserver),
    )
    .await;

    session.set_status("0", StepStatus::Completed).unwrap();
    assert!(session.is_saving());
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert_eq!(session.status_of("0"), StepStatus::Completed);
    assert_eq!(session.progress(), 50);
    assert!(!session.is_saving());

    session.shutdown().await;
    assert_eq!(store.status_writes().len(), 1);
}

#[tokio::test]
async fn unknown_step_is_rejected_without_side_effects() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.insert(id, RoadmapState::default());
    let mut session = open_with(
        SessionInput::new(linear(2)).with_roadmap_id(id),
        &store,
        Arc::new(NoopObserver),
    )
    .await;
    let before = session.status_map().clone();
    let pending_before = session.pending_writes();

    assert!(matches!(session.advance("ghost"), Err(EngineError::UnknownStep(id)) if id == "ghost"));
    assert!(session.drag("ghost", Position::new(1.0, 1.0)).is_err());
    assert!(session.click("ghost").is_err());

    assert_eq!(session.status_map(), &before);
    assert_eq!(session.pending_writes(), pending_before);
    session.shutdown().await;
}

// ============================================================
// Drag and click
// ============================================================

#[tokio::test]
async fn drag_persists_once_at_drag_end() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.insert(id, RoadmapState {
        positions: NodePositions::new(),
        status: status(&[("0", StepStatus::Pending), ("1", StepStatus::Pending), ("2", StepStatus::Pending)]),
    });
    let observer = Arc::new(RecordingObserver::default());

    let mut session = open_with(
        SessionInput::new(fork()).with_roadmap_id(id),
        &store,
        observer.clone(),
    )
    .await;
    let untouched = session.node("2").unwrap().position;

    for step in 0..10 {
        session.drag("1", Position::new(step as f64, 2.0 * step as f64)).unwrap();
    }
    assert_eq!(session.pending_writes(), 0);
    assert!(store.writes().is_empty());

    assert!(session.end_drag());
    assert!(!session.end_drag());
    assert_eq!(session.layout_mode(), LayoutMode::Restored);

    session.shutdown().await;

    let written = store.position_writes();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].len(), 3);
    assert_eq!(written[0]["1"], Position::new(9.0, 18.0));
    assert_eq!(written[0]["2"], untouched);
    assert_eq!(observer.events(), vec!["positions 3"]);
}

#[tokio::test]
async fn click_returns_the_step_and_notifies() {
    let store = MemoryStore::new();
    let observer = Arc::new(RecordingObserver::default());
    let session = open_with(SessionInput::new(fork()), &store, observer.clone()).await;

    let step = session.click("2").unwrap();
    assert_eq!(step.title, "C");
    assert_eq!(observer.events(), vec!["click C"]);
}

// ============================================================
// Step list changes
// ============================================================

#[tokio::test]
async fn replacing_steps_keeps_status_and_adds_pending_entries() {
    let store = MemoryStore::new();
    let mut session = open_with(SessionInput::new(linear(2)), &store, Arc::new(NoopObserver)).await;
    session.set_status("0", StepStatus::Completed).unwrap();
    assert_eq!(session.progress(), 50);

    session.replace_steps(&linear(4));
    assert_eq!(session.nodes().len(), 4);
    assert_eq!(session.status_of("0"), StepStatus::Completed);
    assert_eq!(session.status_of("3"), StepStatus::Pending);
    assert_eq!(session.progress(), 25);
    assert!(!session.edges()[0].visual.animated);

    // Removing steps keeps their stale status entries.
    session.replace_steps(&linear(1));
    assert_eq!(session.status_map().len(), 4);
    assert_eq!(session.progress(), 100);
}

// ============================================================
// Write ordering
// ============================================================

/// Store whose first status write is slow, so later writes would overtake
/// it if the writer did not serialise them.
#[derive(Clone)]
struct SlowFirstWrite {
    inner: MemoryStore,
    first_done: Arc<Mutex<bool>>,
}

#[async_trait]
impl RoadmapStore for SlowFirstWrite {
    async fn load_state(&self, roadmap_id: Uuid) -> Result<RoadmapState, StoreError> {
        self.inner.load_state(roadmap_id).await
    }

    async fn save_status(&self, roadmap_id: Uuid, status: &StepStatusMap) -> Result<(), StoreError> {
        let slow = {
            let mut done = self.first_done.lock().unwrap();
            !std::mem::replace(&mut *done, true)
        };
        if slow {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.inner.save_status(roadmap_id, status).await
    }

    async fn save_positions(
        &self,
        roadmap_id: Uuid,
        positions: &NodePositions,
    ) -> Result<(), StoreError> {
        self.inner.save_positions(roadmap_id, positions).await
    }
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_write_cannot_clobber_a_newer_one() {
    let inner = MemoryStore::new();
    let id = Uuid::new_v4();
    inner.insert(id, RoadmapState {
        positions: NodePositions::new(),
        status: status(&[("0", StepStatus::Pending)]),
    });
    let store: Arc<dyn RoadmapStore> = Arc::new(SlowFirstWrite {
        inner: inner.clone(),
        first_done: Arc::new(Mutex::new(false)),
    });

    let mut session = RoadmapSession::open(
        SessionInput::new(linear(1)).with_roadmap_id(id),
        Some(store),
        Arc::new(NoopObserver),
        SessionConfig::default(),
    )
    .await;

    session.advance("0").unwrap();
    // Writer picks up the first (slow) write and parks in its sleep.
    tokio::task::yield_now().await;
    session.advance("0").unwrap();
    session.advance("0").unwrap();
    assert!(session.is_saving());

    session.shutdown().await;

    let final_status = inner.state(id).unwrap().status;
    assert_eq!(final_status, status(&[("0", StepStatus::Pending)]));
    assert_eq!(
        inner.status_writes(),
        vec![
            status(&[("0", StepStatus::InProgress)]),
            status(&[("0", StepStatus::Pending)]),
        ]
    );
}
