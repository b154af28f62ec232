//! Observatory Night
//!
//! This example drives the observatory workflow through one night:
//! start-up, a few observing cycles and parking at dawn.
//!
//! Key concepts:
//! - Loading a statechart from a YAML definition
//! - Guards answered by shared hardware state
//! - Entry and exit callbacks through an action registry
//! - Checkpointing the machine between cycles
//!
//! Run with: RUST_LOG=skyward=debug cargo run --example observatory

use skyward::builder::MachineBuilder;
use skyward::core::GuardRegistry;
use skyward::definition::Statechart;
use skyward::effects::{ActionError, ActionRegistry};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Default)]
struct Hardware {
    cameras_ready: AtomicBool,
    mount_is_tracking: AtomicBool,
    targets_left: AtomicUsize,
    exposures: AtomicUsize,
}

impl Hardware {
    fn has_target(&self) -> bool {
        self.targets_left.load(Ordering::SeqCst) > 0
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Observatory Night ===\n");

    let chart = Statechart::from_path(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/observatory.yaml"
    ))?;
    println!(
        "Loaded {} states and {} transitions",
        chart.graph().len(),
        chart.table().len()
    );

    let guards = GuardRegistry::new()
        .register("initialize", |hw: &Hardware| hw.cameras_ready.load(Ordering::SeqCst))
        .register("has_target", Hardware::has_target)
        .register("mount_is_tracking", |hw: &Hardware| {
            hw.mount_is_tracking.load(Ordering::SeqCst)
        })
        .register("has_visits", Hardware::has_target)
        .register("has_exposures", |hw: &Hardware| hw.exposures.load(Ordering::SeqCst) < 3);

    let actions = ActionRegistry::new()
        .with_entry("slewing", |hw: &Hardware| {
            println!("  [mount] slewing to target");
            hw.mount_is_tracking.store(true, Ordering::SeqCst);
            Ok(())
        })
        .with_entry("observing", |hw: &Hardware| {
            let n = hw.exposures.fetch_add(1, Ordering::SeqCst) + 1;
            println!("  [camera] exposure {n}");
            Ok(())
        })
        .with_entry("analyzing", |_: &Hardware| {
            println!("  [pipeline] analyzing frame");
            Ok(())
        })
        .with_exit("working", |hw: &Hardware| {
            if hw.mount_is_tracking.swap(false, Ordering::SeqCst) {
                println!("  [mount] stopped tracking");
                Ok(())
            } else {
                Err(ActionError::new("mount was not tracking"))
            }
        });

    let machine = MachineBuilder::new()
        .statechart(chart)
        .guards(guards)
        .actions(actions)
        .build()?;

    let hw = Hardware {
        targets_left: AtomicUsize::new(2),
        ..Hardware::default()
    };

    println!("\n1. Start-up");
    machine.fire("get_ready", &hw)?;
    println!("   wakeup before cameras are ready: {:?}", machine.fire("wakeup", &hw)?);
    hw.cameras_ready.store(true, Ordering::SeqCst);
    machine.fire("wakeup", &hw)?;
    machine.fire("schedule", &hw)?;
    println!("   active: {:?}", machine.active_leaves());

    println!("\n2. Observing");
    while hw.has_target() {
        machine.fire("visit", &hw)?;
        machine.fire("track", &hw)?;
        loop {
            let outcome = machine.fire("observe", &hw)?;
            if !outcome.is_committed() {
                break;
            }
            machine.fire("analyze", &hw)?;
            machine.fire("correct_tracking", &hw)?;
            println!("   active: {:?}", machine.active_leaves());
        }
        machine.fire("schedule", &hw)?;
        hw.targets_left.fetch_sub(1, Ordering::SeqCst);
        hw.exposures.store(0, Ordering::SeqCst);
        let checkpoint = machine.checkpoint();
        println!(
            "   checkpoint {} at version {}",
            checkpoint.id, checkpoint.configuration.version
        );
    }

    println!("\n3. Dawn");
    machine.fire("park", &hw)?;
    machine.fire("sleep", &hw)?;
    println!("   active: {:?}", machine.active_leaves());

    println!("\nLast transitions:");
    for record in machine.history().records() {
        println!(
            "  v{:<3} {:<16} {} -> {}",
            record.version, record.trigger, record.source, record.dest
        );
    }

    Ok(())
}
