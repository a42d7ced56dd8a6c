use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::Error;
use crate::api::RemoClient;
use crate::capability::{CapabilityModel, normalize};
use crate::types::RawAppliance;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

type CapabilityCallback = Box<dyn Fn(&CapabilityModel) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&RawAppliance) + Send + Sync>;

pub struct CoordinatorBuilder {
    api: RemoClient,
    appliance_id: String,
    poll_interval: Duration,
    capability_callbacks: Vec<CapabilityCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
}

impl CoordinatorBuilder {
    pub fn new(api: RemoClient, appliance_id: impl Into<String>) -> Self {
        Self {
            api,
            appliance_id: appliance_id.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            capability_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Fires when a poll produced a capability model structurally
    /// different from the cached one (firmware or feature changes).
    pub fn on_capabilities_changed(
        mut self,
        f: impl Fn(&CapabilityModel) + Send + Sync + 'static,
    ) -> Self {
        self.capability_callbacks.push(Box::new(f));
        self
    }

    /// Fires on every successful poll with the fresh raw snapshot.
    pub fn on_snapshot(mut self, f: impl Fn(&RawAppliance) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> Coordinator {
        Coordinator {
            inner: Arc::new(Inner {
                api: self.api,
                appliance_id: self.appliance_id,
                poll_interval: self.poll_interval,
                cache: RwLock::new(Cache {
                    model: Arc::new(CapabilityModel::default()),
                    snapshot: None,
                    last_update_ok: false,
                }),
                fetch_gate: Mutex::new(()),
                fetch_seq: AtomicU64::new(0),
                wakeup: Notify::new(),
                capability_callbacks: self.capability_callbacks,
                snapshot_callbacks: self.snapshot_callbacks,
            }),
        }
    }
}

/// Owns the refresh cycle for one appliance. Cheap to clone; all clones
/// share the same cache and the same in-flight fetch.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    api: RemoClient,
    appliance_id: String,
    poll_interval: Duration,
    cache: RwLock<Cache>,
    // Serializes outbound fetches. A refresh that finds the gate held
    // waits for the holder and adopts its outcome instead of fetching
    // again.
    fetch_gate: Mutex<()>,
    fetch_seq: AtomicU64,
    wakeup: Notify,
    capability_callbacks: Vec<CapabilityCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
}

struct Cache {
    model: Arc<CapabilityModel>,
    snapshot: Option<Arc<RawAppliance>>,
    last_update_ok: bool,
}

impl Coordinator {
    pub fn builder(api: RemoClient, appliance_id: impl Into<String>) -> CoordinatorBuilder {
        CoordinatorBuilder::new(api, appliance_id)
    }

    pub fn appliance_id(&self) -> &str {
        &self.inner.appliance_id
    }

    pub(crate) fn api(&self) -> &RemoClient {
        &self.inner.api
    }

    /// Latest normalized capability model. Replaced wholesale by polls;
    /// the returned handle stays valid across replacements.
    pub fn model(&self) -> Arc<CapabilityModel> {
        self.inner.cache.read().expect("cache lock poisoned").model.clone()
    }

    /// Last good raw snapshot, if any poll has succeeded yet. Retained
    /// across failed cycles.
    pub fn snapshot(&self) -> Option<Arc<RawAppliance>> {
        self.inner.cache.read().expect("cache lock poisoned").snapshot.clone()
    }

    /// True iff the most recent poll cycle succeeded.
    pub fn last_update_ok(&self) -> bool {
        self.inner.cache.read().expect("cache lock poisoned").last_update_ok
    }

    /// Run one poll cycle now. Concurrent calls collapse onto a single
    /// outbound fetch: whoever holds the gate fetches, late arrivals
    /// wait and adopt that cycle's outcome. Returns the availability
    /// flag after the cycle.
    pub async fn refresh(&self) -> bool {
        let seq_at_entry = self.inner.fetch_seq.load(Ordering::Acquire);
        let _gate = match self.inner.fetch_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                let gate = self.inner.fetch_gate.lock().await;
                if self.inner.fetch_seq.load(Ordering::Acquire) != seq_at_entry {
                    // the fetch we were waiting on completed; adopt it
                    return self.last_update_ok();
                }
                gate
            }
        };
        let ok = self.fetch_once().await;
        self.inner.fetch_seq.fetch_add(1, Ordering::AcqRel);
        ok
    }

    /// Ask the background loop to poll ahead of schedule. Non-blocking;
    /// the nudge is latched if the loop is mid-cycle.
    pub fn request_refresh(&self) {
        self.inner.wakeup.notify_one();
    }

    /// Drive the scheduled cycle on the current tokio runtime. A
    /// `request_refresh` shortens the wait until the next poll.
    pub fn spawn(&self) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                let wakeup = coordinator.inner.wakeup.notified();
                tokio::select! {
                    _ = tokio::time::sleep(coordinator.inner.poll_interval) => {}
                    _ = wakeup => {}
                }
                coordinator.refresh().await;
            }
        })
    }

    async fn fetch_once(&self) -> bool {
        let listing = match self.inner.api.list_appliances().await {
            Ok(listing) => listing,
            Err(Error::Auth) => {
                warn!("appliance update failed: access token rejected, replace the credential");
                return self.mark_failed();
            }
            Err(e) => {
                warn!(error = %e, "appliance update failed: vendor API unreachable");
                return self.mark_failed();
            }
        };

        let Some(raw) = listing.into_iter().find(|a| a.id == self.inner.appliance_id) else {
            warn!(
                appliance_id = %self.inner.appliance_id,
                "appliance update failed: id missing from listing"
            );
            return self.mark_failed();
        };

        self.adopt(raw);
        true
    }

    /// A failed cycle only flips the availability flag; the last good
    /// model and snapshot stay readable (stale-but-available).
    fn mark_failed(&self) -> bool {
        self.inner.cache.write().expect("cache lock poisoned").last_update_ok = false;
        false
    }

    fn adopt(&self, raw: RawAppliance) {
        let model = normalize(&raw);
        let raw = Arc::new(raw);

        let changed_model = {
            let mut cache = self.inner.cache.write().expect("cache lock poisoned");
            cache.last_update_ok = true;
            cache.snapshot = Some(raw.clone());
            if *cache.model != model {
                let model = Arc::new(model);
                cache.model = model.clone();
                Some(model)
            } else {
                None
            }
        };

        if let Some(model) = &changed_model {
            debug!(modes = ?model.mode_order, "capability model changed");
            for cb in &self.inner.capability_callbacks {
                cb(model);
            }
        }
        for cb in &self.inner.snapshot_callbacks {
            cb(&raw);
        }
    }
}
