mod common;

use common::{Harness, Script, light_config, lux_words};
use domain::{CHANNEL_COUNT, DomainError, SnapshotRepository};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn toggle_energizes_only_the_requested_channel() {
    let harness = Harness::new(&[]);

    assert!(harness.outputs.toggle(3).await.unwrap());
    assert!(harness.outputs.get(3).unwrap());

    let snapshot = harness.store.read_snapshot();
    for (i, output) in snapshot.outputs.iter().enumerate() {
        assert_eq!(output.energized, i == 3, "channel {}", i);
    }
    assert_eq!(harness.pins.levels.lock().unwrap().get(&13), Some(&true));
}

#[tokio::test]
async fn toggle_is_persisted_without_waiting_for_a_poll() {
    let devices = vec![light_config(100)];
    let harness = Harness::new(&devices);
    let scheduler = harness.scheduler(&devices, Duration::from_secs(10));

    harness.link.script(1, 0x0000, Script::Respond(lux_words(120)));
    scheduler.run_cycle().await;
    assert_eq!(harness.repository.saved.lock().unwrap().len(), 1);

    assert!(harness.outputs.toggle(3).await.unwrap());

    let persisted = harness.repository.load().await.unwrap().unwrap();
    assert_eq!(persisted.cycle, 1);
    assert!(persisted.outputs[3].energized);
    assert_eq!(harness.repository.saved.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn failed_flush_keeps_the_command_applied() {
    let harness = Harness::new(&[]);
    harness.repository.fail.store(true, Ordering::SeqCst);

    let state = harness.outputs.set(2, true).await.unwrap();

    assert!(state.energized);
    assert!(harness.outputs.get(2).unwrap());
    assert_eq!(harness.persister.failures(), 1);
    assert!(harness.repository.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_channel_changes_nothing() {
    let harness = Harness::new(&[]);
    harness.outputs.set(0, true).await.unwrap();
    let before = harness.store.read_snapshot();
    let levels_before = harness.pins.levels.lock().unwrap().clone();
    let saves_before = harness.repository.saved.lock().unwrap().len();

    assert_eq!(
        harness.outputs.toggle(8).await,
        Err(DomainError::InvalidChannel(8))
    );
    assert_eq!(
        harness.outputs.set(usize::MAX, true).await,
        Err(DomainError::InvalidChannel(usize::MAX))
    );

    assert_eq!(harness.store.read_snapshot(), before);
    assert_eq!(*harness.pins.levels.lock().unwrap(), levels_before);
    assert_eq!(harness.repository.saved.lock().unwrap().len(), saves_before);
}

#[tokio::test]
async fn set_is_visible_in_the_next_snapshot() {
    let harness = Harness::new(&[]);

    let state = harness.outputs.set(6, true).await.unwrap();
    assert!(state.energized);
    assert!(harness.store.read_snapshot().outputs[6].energized);
    assert!(harness.outputs.get(6).unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_leave_pins_and_state_in_agreement() {
    let harness = Harness::new(&[]);
    let outputs = harness.outputs.clone();

    let mut tasks = Vec::new();
    for worker in 0..8usize {
        let outputs = Arc::clone(&outputs);
        tasks.push(tokio::spawn(async move {
            for i in 0..101 {
                outputs.toggle((worker + i) % CHANNEL_COUNT).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = harness.store.read_snapshot();
    let levels = harness.pins.levels.lock().unwrap();
    for output in &snapshot.outputs {
        assert_eq!(levels.get(&output.pin), Some(&output.energized));
    }

    // The last flush wrote the final state
    let persisted = harness.repository.load().await.unwrap().unwrap();
    assert_eq!(persisted.outputs, snapshot.outputs);
}
