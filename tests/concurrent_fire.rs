//! `fire` calls from many threads are serialized.

use skyward::builder::MachineBuilder;
use skyward::config::MachineOptions;
use skyward::core::StateId;
use skyward::definition::Statechart;
use skyward::effects::{ActionDispatcher, ActionError, Machine};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const CHART: &str = r#"
initial: idle
states:
  - idle
  - name: exposing
    regions:
      - name: camera
        children: [integrating, reading]
      - name: mount
        children: [guiding, settling]
transitions:
  - { source: idle, dest: idle, trigger: tick }
  - { source: idle, dest: exposing, trigger: expose }
  - { source: integrating, dest: reading, trigger: step }
  - { source: reading, dest: integrating, trigger: step }
  - { source: guiding, dest: settling, trigger: step }
  - { source: settling, dest: guiding, trigger: step }
"#;

/// Fails the test if two callbacks ever overlap.
#[derive(Default)]
struct Exclusive {
    busy: AtomicBool,
    overlaps: AtomicUsize,
    entries: AtomicUsize,
}

impl Exclusive {
    fn enter(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::yield_now();
        self.busy.store(false, Ordering::SeqCst);
    }
}

struct Shared(Arc<Exclusive>);

impl ActionDispatcher<()> for Shared {
    fn on_exit(&self, _: &StateId, _: &()) -> Result<(), ActionError> {
        self.0.enter();
        Ok(())
    }

    fn on_entry(&self, _: &StateId, _: &()) -> Result<(), ActionError> {
        self.0.entries.fetch_add(1, Ordering::SeqCst);
        self.0.enter();
        Ok(())
    }
}

fn machine(probe: &Arc<Exclusive>) -> Arc<Machine<()>> {
    Arc::new(
        MachineBuilder::new()
            .statechart(Statechart::from_yaml_str(CHART).unwrap())
            .actions(Shared(Arc::clone(probe)))
            .options(MachineOptions::default().history_capacity(8))
            .build()
            .unwrap(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fires_are_linearized() {
    let probe = Arc::new(Exclusive::default());
    let m = machine(&probe);

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let m = Arc::clone(&m);
            tokio::task::spawn_blocking(move || {
                for _ in 0..25 {
                    assert!(m.fire("tick", &()).unwrap().is_committed());
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(probe.entries.load(Ordering::SeqCst), 32 * 25);
    assert_eq!(m.version(), 32 * 25);
    assert_eq!(m.history().len(), 8);
    assert_eq!(m.active_leaves(), vec!["idle"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_always_see_a_legal_configuration() {
    let probe = Arc::new(Exclusive::default());
    let m = machine(&probe);
    m.fire("expose", &()).unwrap();

    let writer = {
        let m = Arc::clone(&m);
        tokio::task::spawn_blocking(move || {
            for _ in 0..500 {
                m.fire("step", &()).unwrap();
            }
        })
    };
    let reader = {
        let m = Arc::clone(&m);
        tokio::task::spawn_blocking(move || {
            let mut last = 0;
            for _ in 0..500 {
                let snapshot = m.snapshot();
                assert!(snapshot.version >= last);
                last = snapshot.version;
                assert_eq!(snapshot.leaves.len(), 2);
                assert!(m.in_state("exposing"));
            }
        })
    };
    writer.await.unwrap();
    reader.await.unwrap();

    // Both regions flip on every step, so an even count lands back on the initial pair.
    assert_eq!(m.active_leaves(), vec!["integrating", "guiding"]);
    assert_eq!(m.version(), 501);
}
