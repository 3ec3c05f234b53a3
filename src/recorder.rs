//! The fetch, guard, persist, publish cycle and its scheduling loop.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::RecorderConfig;
use crate::error::{FetchError, PublishError, StoreError};
use crate::observation::Observation;
use crate::publish::{Publisher, VersionControl};
use crate::source::ObservationSource;
use crate::store::{DuplicateGuard, RecordStore};

/// What happened during one cycle.
///
/// Every failure is captured here; a cycle never propagates an error.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The observation was persisted, and published if publishing is enabled.
    Recorded {
        observation: Observation,
        published: bool,
    },
    /// The period was already recorded; nothing was written or published.
    Duplicate(Observation),
    FetchFailed(FetchError),
    StoreFailed(StoreError),
    /// The observation was persisted but could not be published.
    PublishFailed {
        observation: Observation,
        error: PublishError,
    },
}

impl CycleOutcome {
    /// Whether the record file was changed this cycle.
    pub fn wrote(&self) -> bool {
        matches!(
            self,
            CycleOutcome::Recorded { .. } | CycleOutcome::PublishFailed { .. }
        )
    }
}

/// Periodic recorder for a single indicator series.
#[derive(Debug)]
pub struct Recorder<S, V> {
    source: S,
    store: RecordStore,
    guard: Option<DuplicateGuard>,
    publisher: Option<Publisher<V>>,
    period: Duration,
}

impl<S: ObservationSource, V: VersionControl> Recorder<S, V> {
    /// Create a recorder. The duplicate guard follows the store's policy and
    /// is not consulted under the overwrite policy.
    pub fn new(
        source: S,
        store: RecordStore,
        publisher: Option<Publisher<V>>,
        period: Duration,
    ) -> Self {
        let policy = store.policy();
        let guard = policy
            .is_append()
            .then(|| DuplicateGuard::new(policy.granularity()));
        Self {
            source,
            store,
            guard,
            publisher,
            period,
        }
    }

    /// Wire a recorder from configuration. Publishing uses `vcs` unless
    /// disabled by `config.publish`.
    pub fn from_config(config: &RecorderConfig, source: S, vcs: V) -> Self {
        let store = RecordStore::new(config.resolved_file_path(), config.policy);
        let publisher = config.publish.then(|| {
            Publisher::new(vcs, config.remote.clone(), config.branch.clone())
                .with_backoff(config.push_backoff())
        });
        Self::new(source, store, publisher, config.cycle_period())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn publisher(&self) -> Option<&Publisher<V>> {
        self.publisher.as_ref()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run a single cycle for the time `now`.
    pub async fn run_once(&self, now: DateTime<Local>) -> CycleOutcome {
        let observation = match self.source.fetch(now).await {
            Ok(observation) => observation,
            Err(e) => {
                error!(source = self.source.description(), error = %e, "Fetch failed, skipping cycle");
                return CycleOutcome::FetchFailed(e);
            }
        };

        if let Some(guard) = &self.guard {
            let last = match self.store.last() {
                Ok(last) => last,
                Err(e) => {
                    error!(path = %self.store.path().display(), error = %e, "Could not read record file");
                    return CycleOutcome::StoreFailed(e);
                }
            };
            if !guard.should_write(&observation, last.as_ref()) {
                info!(timestamp = %observation.timestamp, "Period already recorded, skipping");
                return CycleOutcome::Duplicate(observation);
            }
        }

        if let Err(e) = self.store.persist(&observation) {
            error!(path = %self.store.path().display(), error = %e, "Could not write record file");
            return CycleOutcome::StoreFailed(e);
        }
        info!(
            timestamp = %observation.timestamp,
            value = %observation.value,
            policy = %self.store.policy(),
            path = %self.store.path().display(),
            "Recorded observation"
        );

        let Some(publisher) = &self.publisher else {
            return CycleOutcome::Recorded {
                observation,
                published: false,
            };
        };

        let changed: Vec<PathBuf> = vec![self.store.path().to_path_buf()];
        match publisher.publish(&changed, observation.value).await {
            Ok(()) => CycleOutcome::Recorded {
                observation,
                published: true,
            },
            Err(error) => {
                warn!(error = %error, "Record written but not published");
                CycleOutcome::PublishFailed { observation, error }
            }
        }
    }

    /// Run a cycle immediately, then one every period, until `stop` fires.
    ///
    /// The stop signal is checked between cycles; a running cycle always
    /// completes. Returns the number of cycles run.
    pub async fn run_forever(&self, mut stop: watch::Receiver<bool>) -> usize {
        let mut cycles = 0;
        loop {
            if *stop.borrow() {
                break;
            }
            self.run_once(Local::now()).await;
            cycles += 1;

            if wait_or_stop(&mut stop, self.period).await {
                break;
            }
        }
        info!(cycles, "Recorder stopped");
        cycles
    }
}

/// Sleep for `period`, returning early with `true` if a stop is requested.
async fn wait_or_stop(stop: &mut watch::Receiver<bool>, period: Duration) -> bool {
    let sleep = tokio::time::sleep(period);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = stop.changed() => {
                // A dropped handle also stops the loop
                if changed.is_err() || *stop.borrow() {
                    return true;
                }
            }
        }
    }
}

/// Handle for stopping [`Recorder::run_forever`].
///
/// Call `stop()` or drop the handle to stop after the current cycle.
#[derive(Debug)]
pub struct StopHandle {
    stop_tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Stop the scheduling loop.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Create a stop handle and the signal to pass to [`Recorder::run_forever`].
pub fn stop_signal() -> (StopHandle, watch::Receiver<bool>) {
    let (stop_tx, stop_rx) = watch::channel(false);
    (StopHandle { stop_tx }, stop_rx)
}
