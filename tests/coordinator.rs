// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling coordinator behaviour against a scripted router.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use azrouter_lib::coordinator::{Coordinator, CoordinatorConfig, PollOutcome};
use azrouter_lib::event::CoordinatorEvent;
use azrouter_lib::subscription::Subscribable;
use azrouter_lib::types::{DeviceId, FieldValue};
use azrouter_lib::{ApiError, Error};
use common::{MockRouter, charger, slave};

fn coordinator(router: &Arc<MockRouter>, config: CoordinatorConfig) -> Coordinator<Arc<MockRouter>> {
    Coordinator::builder(Arc::clone(router)).config(config).build()
}

fn timeout() -> ApiError {
    ApiError::Unreachable("request timed out".to_string())
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn failing_device_does_not_affect_others() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    assert_eq!(coordinator.refresh().await.unwrap(), PollOutcome::Success);
    let before = coordinator.state();

    router.fail_device("2", Some(timeout()));
    let mut events = coordinator.subscribe();
    assert_eq!(
        coordinator.refresh().await.unwrap(),
        PollOutcome::PartialFailure
    );

    let state = coordinator.state();
    assert!(state.integration_available);
    assert!(coordinator.last_update_success());

    let boiler = state.device(&DeviceId::new("1")).unwrap();
    assert!(boiler.is_available());
    assert!(
        boiler.snapshot.as_ref().unwrap().last_updated
            >= before.snapshot(&DeviceId::new("1")).unwrap().last_updated
    );

    let tank = state.device(&DeviceId::new("2")).unwrap();
    assert!(!tank.is_available());
    assert_eq!(tank.failures, 1);
    assert!(tank.last_error.as_deref().unwrap().contains("timed out"));
    // The last values are kept for display, only flagged unavailable.
    assert_eq!(
        tank.snapshot.as_ref().unwrap().get("power_total"),
        Some(&FieldValue::Number(300.0))
    );

    assert!(drain(&mut events).contains(&CoordinatorEvent::DeviceAvailabilityChanged {
        device_id: DeviceId::new("2"),
        available: false,
        error: Some(timeout().to_string()),
    }));
}

#[tokio::test]
async fn device_recovers_on_next_success() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    router.fail_device("2", Some(timeout()));
    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
    assert_eq!(coordinator.state().device(&DeviceId::new("2")).unwrap().failures, 2);

    router.fail_device("2", None);
    assert_eq!(coordinator.refresh().await.unwrap(), PollOutcome::Success);
    let state = coordinator.state();
    let tank = state.device(&DeviceId::new("2")).unwrap();
    assert!(tank.is_available());
    assert_eq!(tank.failures, 0);
    assert!(tank.last_error.is_none());
}

#[tokio::test]
async fn master_failure_keeps_last_snapshot() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    coordinator.refresh().await.unwrap();
    let good = coordinator.state();

    router.fail_master(Some(timeout()));
    assert_eq!(
        coordinator.refresh().await.unwrap(),
        PollOutcome::TotalFailure
    );

    let state = coordinator.state();
    assert_eq!(state.master, good.master);
    assert_eq!(state.devices, good.devices);
    assert_eq!(state.last_success, good.last_success);
    assert!(state.integration_available);
    assert!(!coordinator.last_update_success());
    // No device is read while the master is down.
    assert_eq!(router.device_calls(), 2);
}

// ============================================================================
// Thresholds
// ============================================================================

#[tokio::test]
async fn master_failures_escalate_at_threshold() {
    for threshold in [1, 2, 3, 5] {
        let router = MockRouter::new();
        let coordinator = coordinator(
            &router,
            CoordinatorConfig::default().with_failure_threshold(threshold),
        );
        coordinator.refresh().await.unwrap();

        router.fail_master(Some(timeout()));
        for _ in 1..threshold {
            coordinator.refresh().await.unwrap();
            assert!(coordinator.state().integration_available, "threshold {threshold}");
        }
        coordinator.refresh().await.unwrap();
        let state = coordinator.state();
        assert!(!state.integration_available, "threshold {threshold}");
        assert_eq!(state.master_failures, threshold);
        assert!(!state.is_device_available(&DeviceId::new("1")));

        router.fail_master(None);
        coordinator.refresh().await.unwrap();
        let state = coordinator.state();
        assert!(state.integration_available);
        assert_eq!(state.master_failures, 0);
    }
}

#[tokio::test]
async fn availability_callbacks_fire_on_change_only() {
    let router = MockRouter::new();
    let coordinator = coordinator(
        &router,
        CoordinatorConfig::default().with_failure_threshold(2),
    );
    let changes = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(AtomicBool::new(false));
    let id = {
        let changes = Arc::clone(&changes);
        let last = Arc::clone(&last);
        coordinator.on_availability_changed(move |available| {
            changes.fetch_add(1, Ordering::SeqCst);
            last.store(available, Ordering::SeqCst);
        })
    };

    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert!(last.load(Ordering::SeqCst));

    router.fail_master(Some(ApiError::Auth));
    for _ in 0..4 {
        coordinator.refresh().await.unwrap();
    }
    assert_eq!(changes.load(Ordering::SeqCst), 2);
    assert!(!last.load(Ordering::SeqCst));

    assert!(coordinator.unsubscribe(id));
    router.fail_master(None);
    coordinator.refresh().await.unwrap();
    assert_eq!(changes.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Device lifecycle
// ============================================================================

#[tokio::test]
async fn unlisted_device_is_removed_after_grace() {
    for grace in [1, 2, 3] {
        let router = MockRouter::new();
        let coordinator = coordinator(&router, CoordinatorConfig::default().with_grace_cycles(grace));
        coordinator.refresh().await.unwrap();
        let mut events = coordinator.subscribe();

        router.unplug("2");
        for cycle in 1..grace {
            coordinator.refresh().await.unwrap();
            let state = coordinator.state();
            let tank = state.device(&DeviceId::new("2")).expect("kept during grace");
            assert_eq!(tank.missing_cycles, cycle);
            assert!(!tank.is_available());
        }
        coordinator.refresh().await.unwrap();
        assert!(coordinator.state().device(&DeviceId::new("2")).is_none(), "grace {grace}");
        assert!(drain(&mut events).contains(&CoordinatorEvent::DeviceRemoved {
            device_id: DeviceId::new("2"),
        }));
    }
}

#[tokio::test]
async fn not_found_counts_toward_grace() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default().with_grace_cycles(2));
    coordinator.refresh().await.unwrap();

    router.fail_device("1", Some(ApiError::NotFound(DeviceId::new("1"))));
    coordinator.refresh().await.unwrap();
    assert!(coordinator.state().device(&DeviceId::new("1")).is_some());
    coordinator.refresh().await.unwrap();
    assert!(coordinator.state().device(&DeviceId::new("1")).is_none());
    assert!(coordinator.state().device(&DeviceId::new("2")).is_some());
}

#[tokio::test]
async fn returning_device_resets_missing_cycles() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    coordinator.refresh().await.unwrap();

    router.unplug("2");
    coordinator.refresh().await.unwrap();
    router.plug(slave(2, "Tank"));
    coordinator.refresh().await.unwrap();

    let state = coordinator.state();
    let tank = state.device(&DeviceId::new("2")).unwrap();
    assert_eq!(tank.missing_cycles, 0);
    assert!(tank.is_available());
}

#[tokio::test]
async fn new_devices_are_announced_in_master_order() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    let mut events = coordinator.subscribe();
    coordinator.refresh().await.unwrap();

    router.plug(charger(7, "Garage", 16));
    coordinator.refresh().await.unwrap();

    let added: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            CoordinatorEvent::DeviceAdded { identity } => Some(identity.device_id),
            _ => None,
        })
        .collect();
    assert_eq!(added, ["1", "2", "7"].map(DeviceId::new));

    let ids: Vec<_> = coordinator
        .state()
        .devices
        .iter()
        .map(|e| e.identity.device_id.clone())
        .collect();
    assert_eq!(ids, ["1", "2", "7"].map(DeviceId::new));
}

// ============================================================================
// Scheduling
// ============================================================================

#[tokio::test]
async fn concurrent_refresh_is_coalesced() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    let gate = router.hold_next_master_read();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    while router.master_calls() == 0 {
        tokio::task::yield_now().await;
    }
    let second = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    gate.notify_one();

    assert_eq!(first.await.unwrap().unwrap(), PollOutcome::Success);
    assert_eq!(second.await.unwrap().unwrap(), PollOutcome::Success);
    assert_eq!(router.master_calls(), 1);
    assert_eq!(coordinator.state().cycle, 1);
}

#[tokio::test]
async fn watchers_see_every_published_state() {
    let router = MockRouter::new();
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    let mut watch = coordinator.watch();

    coordinator.refresh().await.unwrap();
    assert!(watch.has_changed().unwrap());
    assert_eq!(watch.borrow_and_update().cycle, 1);

    let cycles = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&cycles);
    coordinator.on_update(move |state| {
        seen.store(usize::try_from(state.cycle).unwrap(), Ordering::SeqCst);
    });
    coordinator.refresh().await.unwrap();
    assert_eq!(cycles.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn loop_polls_on_interval_until_shutdown() {
    let router = MockRouter::new();
    let coordinator = coordinator(
        &router,
        CoordinatorConfig::default().with_interval(Duration::from_secs(30)),
    );
    coordinator.start();
    coordinator.start();

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(router.master_calls(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(router.master_calls(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(router.master_calls(), 2);

    coordinator.shutdown().await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(router.master_calls(), 2);
    assert!(matches!(coordinator.refresh().await, Err(Error::ShutDown)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_a_running_cycle() {
    let router = MockRouter::new();
    let coordinator = coordinator(
        &router,
        CoordinatorConfig::default().with_interval(Duration::from_secs(10)),
    );
    let _gate = router.hold_next_master_read();
    coordinator.start();

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(router.master_calls(), 1);

    coordinator.shutdown().await;
    assert_eq!(coordinator.state().cycle, 0);
}

#[tokio::test]
async fn shutdown_interrupts_a_manual_refresh() {
    let router = MockRouter::with_devices(vec![slave(1, "Boiler")]);
    let coordinator = coordinator(&router, CoordinatorConfig::default());
    let mut events = coordinator.subscribe();
    let gate = router.hold_next_master_read();

    let running = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    while router.master_calls() == 0 {
        tokio::task::yield_now().await;
    }
    let waiting = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    coordinator.shutdown().await;
    gate.notify_one();

    assert!(matches!(running.await.unwrap(), Err(Error::ShutDown)));
    assert!(matches!(waiting.await.unwrap(), Err(Error::ShutDown)));
    assert_eq!(router.device_calls(), 0);
    assert_eq!(coordinator.state().cycle, 0);
    assert!(!coordinator.state().integration_available);
    assert!(drain(&mut events).is_empty());
}
