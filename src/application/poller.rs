//! Background completion polling for long-running renders.
//!
//! One in-process timer per item, deduplicated through a shared map. A fired
//! poll removes its own entry before running so a reschedule triggered by the
//! fired callback is not mistaken for a duplicate. Polls are retried
//! indefinitely on transient failure; nobody waits on them synchronously, so
//! failures are logged and never surfaced.
//!
//! The map lives in process memory only: a restart loses every armed timer
//! and leaves reconciliation to the operator.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::library::{PollVerdict, VideoLibraryService};

#[derive(Clone)]
pub struct AsyncCompletionPoller {
    entries: Arc<DashMap<Uuid, JoinHandle<()>>>,
    interval: Duration,
}

impl AsyncCompletionPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            interval,
        }
    }

    pub fn is_scheduled(&self, item_id: Uuid) -> bool {
        self.entries.contains_key(&item_id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Arm a poll for the item unless one is already armed.
    pub fn schedule(
        &self,
        service: Arc<VideoLibraryService>,
        owner_user_id: Uuid,
        item_id: Uuid,
    ) {
        use dashmap::mapref::entry::Entry;

        match self.entries.entry(item_id) {
            Entry::Occupied(_) => {
                debug!(
                    target = "application::poller",
                    item_id = %item_id,
                    "poll already scheduled"
                );
            }
            Entry::Vacant(vacant) => {
                let poller = self.clone();
                let entries = Arc::clone(&self.entries);
                let interval = self.interval;
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    // Drop our own entry first; the callback below may arm
                    // the next poll for this very item.
                    entries.remove(&item_id);
                    counter!("vetrina_polls_fired_total").increment(1);

                    match service.poll_render(owner_user_id, item_id).await {
                        Ok(PollVerdict::Pending) => {
                            poller.schedule(service, owner_user_id, item_id);
                        }
                        Ok(PollVerdict::Settled) => {
                            debug!(
                                target = "application::poller",
                                item_id = %item_id,
                                "poll settled"
                            );
                        }
                        Err(err) => {
                            warn!(
                                target = "application::poller",
                                item_id = %item_id,
                                error = %err,
                                "poll attempt failed, rescheduling"
                            );
                            poller.schedule(service, owner_user_id, item_id);
                        }
                    }
                });
                vacant.insert(handle);
            }
        }
    }
}
