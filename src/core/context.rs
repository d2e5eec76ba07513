//! Maintenance context - process-wide view of the maintenance flag.
//!
//! The context is loaded once from the site copy of the flag and then kept
//! current by optimistic toggles and admin-triggered synchronization. Toggles
//! flip the local value immediately, write the site copy, and fall back to the
//! last confirmed value if the write fails. Routine toggles never touch the
//! global document; only [`MaintenanceContext::synchronize`] reconciles the two.

use crate::{
    core::{
        flag::SyncSource, maintenance_store::MaintenanceStore,
        reconciler::MaintenanceReconciler,
    },
    errors::{Error, Result},
};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

/// Local knowledge of the maintenance flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaintenanceState {
    /// Not loaded yet
    Unknown,
    /// Loaded or optimistically set
    Known(bool),
}

impl MaintenanceState {
    /// The flag value, if known.
    #[must_use]
    pub const fn is_active(self) -> Option<bool> {
        match self {
            Self::Unknown => None,
            Self::Known(value) => Some(value),
        }
    }
}

/// Progress of the most recent optimistic toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleState {
    /// No toggle has been issued since the last load
    Idle,
    /// At least one write is in flight
    Pending {
        /// State shown before the most recent toggle
        previous: MaintenanceState,
        /// Value the most recent toggle is writing
        target: bool,
    },
    /// Every write has resolved and the last response was a success
    Committed(bool),
    /// Every write has resolved and the last response was a failure
    RolledBack {
        /// Confirmed state restored after the failure
        previous: MaintenanceState,
        /// Why the write failed
        reason: String,
    },
}

#[derive(Debug)]
struct ContextInner {
    state: MaintenanceState,
    confirmed: MaintenanceState,
    toggle: ToggleState,
    message: Option<String>,
    latest: u64,
    in_flight: usize,
}

impl ContextInner {
    const fn new() -> Self {
        Self {
            state: MaintenanceState::Unknown,
            confirmed: MaintenanceState::Unknown,
            toggle: ToggleState::Idle,
            message: None,
            latest: 0,
            in_flight: 0,
        }
    }
}

/// Shared maintenance state for the rendering tree.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct MaintenanceContext {
    store: MaintenanceStore,
    reconciler: MaintenanceReconciler,
    inner: Arc<Mutex<ContextInner>>,
    state_tx: Arc<watch::Sender<MaintenanceState>>,
}

impl MaintenanceContext {
    /// Creates a context in the `Unknown` state.
    #[must_use]
    pub fn new(store: MaintenanceStore) -> Self {
        let (state_tx, _) = watch::channel(MaintenanceState::Unknown);
        Self {
            reconciler: MaintenanceReconciler::new(store.clone()),
            store,
            inner: Arc::new(Mutex::new(ContextInner::new())),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Loads the flag from the site copy: `Unknown -> Known(v)`.
    ///
    /// On failure the state stays `Unknown`.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<bool> {
        let snapshot = self.store.read_site_snapshot().await?;
        let value = snapshot.is_active;
        let mut inner = self.inner.lock().await;
        inner.state = MaintenanceState::Known(value);
        inner.confirmed = MaintenanceState::Known(value);
        inner.toggle = ToggleState::Idle;
        inner.message = snapshot.message;
        self.publish(inner.state);
        info!(is_active = value, "Maintenance context loaded");
        Ok(value)
    }

    /// Returns the context to `Unknown`, dropping any toggle bookkeeping.
    ///
    /// Writes still in flight resolve against the reset state.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = MaintenanceState::Unknown;
        inner.confirmed = MaintenanceState::Unknown;
        inner.toggle = ToggleState::Idle;
        inner.message = None;
        self.publish(inner.state);
    }

    /// Current local state.
    pub async fn state(&self) -> MaintenanceState {
        self.inner.lock().await.state
    }

    /// Current value of the flag, `None` before the first load.
    pub async fn is_maintenance_mode(&self) -> Option<bool> {
        self.state().await.is_active()
    }

    /// Banner text stored with the site copy of the flag, if any.
    pub async fn message(&self) -> Option<String> {
        self.inner.lock().await.message.clone()
    }

    /// Progress of the most recent toggle.
    pub async fn toggle_state(&self) -> ToggleState {
        self.inner.lock().await.toggle.clone()
    }

    /// Whether any toggle write is still in flight.
    pub async fn is_pending(&self) -> bool {
        self.inner.lock().await.in_flight > 0
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MaintenanceState> {
        self.state_tx.subscribe()
    }

    /// Optimistically sets the flag and writes the site copy, along with
    /// `message` when one is given.
    ///
    /// The new value is visible immediately. When the write fails the state
    /// returns to the last value confirmed by the store and the error is
    /// returned to the caller; there is no retry. Overlapping calls are not
    /// de-duplicated: once all of them have resolved, the state matches the
    /// last successful response.
    #[instrument(skip(self))]
    pub async fn set_maintenance_mode(&self, value: bool, message: Option<&str>) -> Result<()> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            inner.latest += 1;
            inner.in_flight += 1;
            inner.toggle = ToggleState::Pending {
                previous: inner.state,
                target: value,
            };
            inner.state = MaintenanceState::Known(value);
            self.publish(inner.state);
            inner.latest
        };

        let result = self.store.write_site_flag(value, message).await;

        let mut inner = self.inner.lock().await;
        inner.in_flight -= 1;
        let is_latest = ticket == inner.latest;
        match &result {
            Ok(()) => {
                inner.confirmed = MaintenanceState::Known(value);
                if let Some(text) = message {
                    inner.message = Some(text.to_string());
                }
                if inner.in_flight == 0 {
                    inner.toggle = ToggleState::Committed(value);
                }
                debug!(ticket, value, "Toggle committed");
            }
            Err(e) => {
                warn!(ticket, value, error = %e, "Toggle failed, rolling back");
                if inner.in_flight == 0 {
                    inner.toggle = ToggleState::RolledBack {
                        previous: inner.confirmed,
                        reason: e.to_string(),
                    };
                } else if is_latest {
                    inner.state = inner.confirmed;
                }
            }
        }
        if inner.in_flight == 0 {
            inner.state = inner.confirmed;
        }
        self.publish(inner.state);
        drop(inner);

        result
    }

    /// Flips the current value through [`Self::set_maintenance_mode`].
    pub async fn toggle(&self) -> Result<bool> {
        let current = self.state().await.is_active().ok_or(Error::StateUnknown)?;
        self.set_maintenance_mode(!current, None).await?;
        Ok(!current)
    }

    /// Reconciles both stored copies and adopts the resolved value locally.
    #[instrument(skip(self))]
    pub async fn synchronize(&self, forced_source: Option<SyncSource>) -> Result<bool> {
        let resolution = self.reconciler.reconcile(forced_source).await?;
        self.adopt(resolution.is_active, resolution.message).await;
        Ok(resolution.is_active)
    }

    /// Writes `value` to both stored copies and adopts it locally.
    #[instrument(skip(self))]
    pub async fn force_set(&self, value: bool, actor: Option<&str>) -> Result<()> {
        self.reconciler.force_set(value, actor).await?;
        self.adopt(value, None).await;
        Ok(())
    }

    async fn adopt(&self, value: bool, message: Option<String>) {
        let mut inner = self.inner.lock().await;
        inner.state = MaintenanceState::Known(value);
        inner.confirmed = MaintenanceState::Known(value);
        if message.is_some() {
            inner.message = message;
        }
        self.publish(inner.state);
    }

    fn publish(&self, state: MaintenanceState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
