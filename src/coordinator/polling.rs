// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The polling coordinator.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::config::CoordinatorConfig;
use super::state::{CoordinatorState, DeviceEntry, PollOutcome};
use crate::error::{ApiError, Error};
use crate::event::{CoordinatorEvent, EventBus};
use crate::normalize::{normalize_at, normalize_master};
use crate::protocol::RouterApi;
use crate::registry::Registry;
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{DeviceId, DeviceIdentity, InstallationId};

/// Owns the refresh cycle and the state of one installation.
///
/// The coordinator is the single writer of [`CoordinatorState`]. Every
/// cycle builds a new state from the previous one and publishes it in one
/// step; readers get it through [`state`](Self::state),
/// [`watch`](Self::watch), the event bus or listener callbacks.
///
/// Cloning is cheap and every clone drives the same coordinator.
///
/// # Examples
///
/// ```no_run
/// use azrouter_lib::coordinator::{Coordinator, CoordinatorConfig};
/// use azrouter_lib::protocol::HttpConfig;
///
/// # async fn example() -> azrouter_lib::Result<()> {
/// let client = HttpConfig::new("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .into_client()?;
/// let coordinator = Coordinator::builder(client)
///     .config(CoordinatorConfig::default())
///     .build();
///
/// coordinator.refresh().await?;
/// coordinator.start();
///
/// let mut updates = coordinator.watch();
/// while updates.changed().await.is_ok() {
///     let state = updates.borrow_and_update().clone();
///     println!("cycle {} available={}", state.cycle, state.integration_available);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Coordinator<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    api: A,
    registry: Arc<Registry>,
    config: CoordinatorConfig,
    installation: InstallationId,
    state_tx: watch::Sender<Arc<CoordinatorState>>,
    events: EventBus,
    callbacks: CallbackRegistry,
    /// Held for the duration of one cycle.
    poll_lock: Mutex<()>,
    cancel: CancellationToken,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<A> Clone for Coordinator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for Coordinator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("installation", &self.inner.installation)
            .field("config", &self.inner.config)
            .field("cycle", &self.inner.state_tx.borrow().cycle)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Coordinator`].
#[derive(Debug)]
pub struct CoordinatorBuilder<A> {
    api: A,
    registry: Option<Arc<Registry>>,
    config: CoordinatorConfig,
    installation: Option<InstallationId>,
    event_capacity: Option<usize>,
}

impl<A> CoordinatorBuilder<A> {
    /// Sets the polling configuration.
    #[must_use]
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom entity registry instead of the built-in tables.
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the installation id; a random one is generated otherwise.
    #[must_use]
    pub fn installation(mut self, installation: InstallationId) -> Self {
        self.installation = Some(installation);
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Builds the coordinator. No request is made until the first refresh.
    #[must_use]
    pub fn build(self) -> Coordinator<A> {
        let (state_tx, _) = watch::channel(Arc::new(CoordinatorState::default()));
        Coordinator {
            inner: Arc::new(Inner {
                api: self.api,
                registry: self
                    .registry
                    .unwrap_or_else(|| Arc::new(Registry::builtin())),
                config: self.config,
                installation: self.installation.unwrap_or_default(),
                state_tx,
                events: self
                    .event_capacity
                    .map_or_else(EventBus::new, EventBus::with_capacity),
                callbacks: CallbackRegistry::new(),
                poll_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task: parking_lot::Mutex::new(None),
            }),
        }
    }
}

impl<A: RouterApi> Coordinator<A> {
    /// Starts building a coordinator around an API client.
    #[must_use]
    pub fn builder(api: A) -> CoordinatorBuilder<A> {
        CoordinatorBuilder {
            api,
            registry: None,
            config: CoordinatorConfig::default(),
            installation: None,
            event_capacity: None,
        }
    }

    /// Returns the API client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// Returns the entity registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Returns the polling configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Returns the installation id.
    #[must_use]
    pub fn installation(&self) -> InstallationId {
        self.inner.installation
    }

    /// Returns the latest published state.
    #[must_use]
    pub fn state(&self) -> Arc<CoordinatorState> {
        Arc::clone(&self.inner.state_tx.borrow())
    }

    /// Returns a receiver notified on every published state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<CoordinatorState>> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribes to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    /// Returns `true` if the last cycle read the master.
    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.inner
            .state_tx
            .borrow()
            .last_outcome
            .is_some_and(PollOutcome::master_succeeded)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Runs one refresh cycle.
    ///
    /// If a cycle is already running, waits for it to finish and returns its
    /// outcome instead of starting another one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`] after [`shutdown`](Self::shutdown), also
    /// when the shutdown interrupts this cycle or the one it waited for. Fetch
    /// failures are not errors; they are reflected in the outcome and state.
    pub async fn refresh(&self) -> Result<PollOutcome, Error> {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }

        let Ok(_guard) = self.inner.poll_lock.try_lock() else {
            tracing::debug!("Refresh requested during a running cycle, coalescing");
            drop(self.inner.poll_lock.lock().await);
            if self.is_shut_down() {
                return Err(Error::ShutDown);
            }
            return self
                .inner
                .state_tx
                .borrow()
                .last_outcome
                .ok_or(Error::ShutDown);
        };

        // A cycle cut short by shutdown publishes nothing.
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(Error::ShutDown),
            outcome = self.poll_cycle() => Ok(outcome),
        }
    }

    async fn poll_cycle(&self) -> PollOutcome {
        let inner = &*self.inner;
        let previous = self.state();
        let mut next = (*previous).clone();
        let mut events = Vec::new();
        next.cycle += 1;

        let outcome = match inner.api.fetch_master().await {
            Err(e) => {
                self.record_master_failure(&mut next, &mut events, &e);
                PollOutcome::TotalFailure
            }
            Ok(payload) => {
                let master = normalize_master(&payload, &inner.registry);
                next.master_failures = 0;
                next.last_success = Some(master.snapshot.last_updated);
                if !next.integration_available {
                    tracing::info!(installation = %inner.installation, "Router available");
                    next.integration_available = true;
                    events.push(CoordinatorEvent::AvailabilityChanged { available: true });
                }

                let listed: Vec<_> = master.identities().cloned().collect();
                next.master = Some(master);

                let results =
                    join_all(listed.iter().map(|i| inner.api.fetch_device(&i.device_id))).await;
                let failed =
                    self.reconcile_devices(&previous, &mut next, &mut events, listed, results);
                if failed {
                    PollOutcome::PartialFailure
                } else {
                    PollOutcome::Success
                }
            }
        };

        next.last_outcome = Some(outcome);
        let cycle = next.cycle;
        self.publish(next, events, outcome);
        tracing::debug!(cycle, ?outcome, "Refresh cycle finished");
        outcome
    }

    fn record_master_failure(
        &self,
        next: &mut CoordinatorState,
        events: &mut Vec<CoordinatorEvent>,
        error: &ApiError,
    ) {
        let threshold = self.inner.config.failure_threshold;
        next.master_failures = next.master_failures.saturating_add(1);

        if matches!(error, ApiError::Auth) {
            tracing::error!(failures = next.master_failures, "Router rejected the credentials");
        } else {
            tracing::warn!(error = %error, failures = next.master_failures, threshold, "Master fetch failed");
        }

        if next.master_failures >= threshold && next.integration_available {
            tracing::error!(
                installation = %self.inner.installation,
                failures = next.master_failures,
                "Router unavailable"
            );
            next.integration_available = false;
            events.push(CoordinatorEvent::AvailabilityChanged { available: false });
        }
    }

    /// Applies device fetch results; returns `true` if any fetch failed.
    fn reconcile_devices(
        &self,
        previous: &CoordinatorState,
        next: &mut CoordinatorState,
        events: &mut Vec<CoordinatorEvent>,
        listed: Vec<DeviceIdentity>,
        results: Vec<Result<serde_json::Value, ApiError>>,
    ) -> bool {
        let grace = self.inner.config.grace_cycles;
        let now = Utc::now();
        let listed_ids: HashSet<DeviceId> = listed.iter().map(|i| i.device_id.clone()).collect();
        let mut devices = Vec::with_capacity(listed.len());
        let mut failed = false;

        for (identity, result) in listed.into_iter().zip(results) {
            let known = previous.device(&identity.device_id);
            let was_available = known.is_some_and(DeviceEntry::is_available);
            let mut entry = match known {
                Some(entry) => DeviceEntry {
                    identity: identity.clone(),
                    ..entry.clone()
                },
                None => {
                    tracing::info!(device_id = %identity.device_id, device_type = %identity.device_type, "Device added");
                    events.push(CoordinatorEvent::DeviceAdded {
                        identity: identity.clone(),
                    });
                    DeviceEntry::new(identity.clone())
                }
            };

            match result {
                Ok(raw) => {
                    entry.snapshot = Some(normalize_at(
                        &identity.device_type,
                        &raw,
                        &self.inner.registry,
                        now,
                    ));
                    entry.failures = 0;
                    entry.missing_cycles = 0;
                    entry.last_error = None;
                }
                Err(e) => {
                    failed = true;
                    entry.failures = entry.failures.saturating_add(1);
                    if matches!(e, ApiError::NotFound(_)) {
                        entry.missing_cycles = entry.missing_cycles.saturating_add(1);
                    } else {
                        entry.missing_cycles = 0;
                    }
                    entry.snapshot = entry.snapshot.as_ref().map(|s| s.unavailable());
                    entry.last_error = Some(e.to_string());
                    tracing::warn!(
                        device_id = %identity.device_id,
                        error = %e,
                        failures = entry.failures,
                        "Device fetch failed"
                    );
                }
            }

            if entry.missing_cycles >= grace {
                remove(events, &entry);
                continue;
            }
            if known.is_some() && was_available != entry.is_available() {
                events.push(availability_event(&entry));
            }
            devices.push(entry);
        }

        // Devices the master stopped listing.
        for known in previous
            .devices
            .iter()
            .filter(|e| !listed_ids.contains(&e.identity.device_id))
        {
            let mut entry = known.clone();
            entry.missing_cycles = entry.missing_cycles.saturating_add(1);
            entry.snapshot = entry.snapshot.as_ref().map(|s| s.unavailable());
            if entry.missing_cycles >= grace {
                remove(events, &entry);
                continue;
            }
            tracing::debug!(
                device_id = %entry.identity.device_id,
                missing_cycles = entry.missing_cycles,
                grace,
                "Device not listed by master"
            );
            if known.is_available() {
                events.push(availability_event(&entry));
            }
            devices.push(entry);
        }

        next.devices = devices;
        failed
    }

    fn publish(&self, next: CoordinatorState, events: Vec<CoordinatorEvent>, outcome: PollOutcome) {
        let inner = &*self.inner;
        let cycle = next.cycle;
        let state = Arc::new(next);
        inner.state_tx.send_replace(Arc::clone(&state));

        for event in events {
            inner.callbacks.dispatch_event(&event);
            inner.events.publish(event);
        }
        inner.events.publish(CoordinatorEvent::Refreshed { cycle, outcome });
        inner.callbacks.dispatch_update(&state);
    }

    /// Stops the periodic loop and any running cycle.
    ///
    /// A cycle cut short publishes nothing. Calling this more than once is
    /// harmless.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let task = self.inner.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Polling task ended abnormally");
        }
        self.inner.callbacks.clear();
        tracing::debug!(installation = %self.inner.installation, "Coordinator shut down");
    }
}

impl<A: RouterApi + 'static> Coordinator<A> {
    /// Spawns the periodic refresh loop on the current tokio runtime.
    ///
    /// The first scheduled cycle runs one interval from now; call
    /// [`refresh`](Self::refresh) first to populate the state immediately.
    /// Does nothing if the loop is already running or the coordinator is
    /// shut down.
    pub fn start(&self) {
        let mut task = self.inner.task.lock();
        if task.is_some() || self.is_shut_down() {
            return;
        }
        *task = Some(tokio::spawn(poll_loop(
            self.clone(),
            self.inner.cancel.child_token(),
        )));
    }
}

impl<A: RouterApi> Subscribable for Coordinator<A> {
    fn on_update<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CoordinatorState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_update(callback)
    }

    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_availability_changed(callback)
    }

    fn on_device_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceId, bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_device_availability_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

fn remove(events: &mut Vec<CoordinatorEvent>, entry: &DeviceEntry) {
    tracing::info!(
        device_id = %entry.identity.device_id,
        missing_cycles = entry.missing_cycles,
        "Device removed"
    );
    events.push(CoordinatorEvent::DeviceRemoved {
        device_id: entry.identity.device_id.clone(),
    });
}

fn availability_event(entry: &DeviceEntry) -> CoordinatorEvent {
    CoordinatorEvent::DeviceAvailabilityChanged {
        device_id: entry.identity.device_id.clone(),
        available: entry.is_available(),
        error: entry.last_error.clone(),
    }
}

async fn poll_loop<A: RouterApi>(coordinator: Coordinator<A>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.config().interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = coordinator.refresh() => {
                        if let Err(e) = result {
                            tracing::warn!(error = %e, "Periodic refresh failed");
                        }
                    }
                }
            }
        }
    }
    tracing::debug!("Polling loop stopped");
}
