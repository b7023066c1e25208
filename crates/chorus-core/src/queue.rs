//! Per-key serialization queue.
//!
//! Every load-modify-store cycle on a sender key record runs through here, so
//! two operations on the same [`SenderKeyName`](crate::SenderKeyName) never
//! interleave. Different keys proceed independently.
//!
//! ```text
//! run(k, a) ─┐
//! run(k, b) ─┼──▶ pending[k] = [a, b, c] ──▶ drain task: a ▶ b ▶ c ──▶ remove k
//! run(k, c) ─┘
//! ```
//!
//! The first task for an idle key spawns a drain task for that key. The
//! drain task takes bounded batches from the key's FIFO and runs each task to
//! completion before starting the next. When the FIFO is empty the key's
//! bookkeeping is removed.
//!
//! Each task runs as its own spawned task so a panic is contained: the
//! submitter sees [`QueueError::TaskAborted`] and the drain moves on.

use std::{
    collections::{HashMap, VecDeque, hash_map::Entry},
    future::Future,
    hash::Hash,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tokio::sync::{Notify, oneshot};

/// Default number of tasks taken from a key's FIFO per drain batch
pub const DEFAULT_BATCH_LIMIT: usize = 10_000;

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Errors from the serialization queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Task panicked or was dropped before producing a result
    #[error("queued task aborted before producing a result")]
    TaskAborted,
}

/// Runs async tasks one at a time per key, in submission order.
///
/// Cheap to clone; clones share the same pending FIFOs. Must be used from
/// within a tokio runtime.
pub struct SerialQueue<K> {
    inner: Arc<Inner<K>>,
}

struct Inner<K> {
    pending: Mutex<HashMap<K, VecDeque<Task>>>,
    batch_limit: usize,
    idle: Notify,
}

impl<K> Inner<K> {
    // Lock poisoning only means a holder panicked between two map operations;
    // the map itself is always consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, VecDeque<Task>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K> Clone for SerialQueue<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K> Default for SerialQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> SerialQueue<K>
where
    K: Clone + Eq + Hash + Send + 'static,
{
    /// Queue with the default batch limit.
    pub fn new() -> Self {
        Self::with_batch_limit(DEFAULT_BATCH_LIMIT)
    }

    /// Queue that takes at most `batch_limit` tasks per drain batch.
    pub fn with_batch_limit(batch_limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(HashMap::new()),
                batch_limit: batch_limit.max(1),
                idle: Notify::new(),
            }),
        }
    }

    /// Enqueue `task` behind every task previously submitted under `key`.
    ///
    /// The task is enqueued when this is called, not when the returned
    /// future is first polled, so call order is execution order. Once
    /// enqueued the task runs to completion even if the returned future is
    /// dropped.
    ///
    /// # Errors
    ///
    /// - `TaskAborted` if the task panicked
    pub fn run<F, T>(
        &self,
        key: K,
        task: F,
    ) -> impl Future<Output = Result<T, QueueError>> + Send + use<K, F, T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task = Box::pin(async move {
            // Submitter may have gone away; the work still counts
            let _ = tx.send(task.await);
        });

        let spawn_drain = match self.inner.lock().entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push_back(task);
                false
            },
            Entry::Vacant(entry) => {
                entry.insert(VecDeque::from([task]));
                true
            },
        };

        if spawn_drain {
            tokio::spawn(drain(Arc::clone(&self.inner), key));
        }

        async move { rx.await.map_err(|_| QueueError::TaskAborted) }
    }

    /// Number of keys with queued or running tasks.
    pub fn active_keys(&self) -> usize {
        self.inner.lock().len()
    }

    /// Number of tasks waiting under `key`, not counting one already running.
    pub fn pending_tasks(&self, key: &K) -> usize {
        self.inner.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Wait until no key has queued or running tasks.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.active_keys() == 0 {
                return;
            }
            notified.await;
        }
    }
}

async fn drain<K>(inner: Arc<Inner<K>>, key: K)
where
    K: Eq + Hash + Send + 'static,
{
    loop {
        let batch: Vec<Task> = {
            let mut pending = inner.lock();
            let Some(queue) = pending.get_mut(&key) else {
                return;
            };

            if queue.is_empty() {
                pending.remove(&key);
                if pending.is_empty() {
                    inner.idle.notify_waiters();
                }
                return;
            }

            let take = queue.len().min(inner.batch_limit);
            queue.drain(..take).collect()
        };

        tracing::trace!(tasks = batch.len(), "draining queue batch");

        for task in batch {
            if let Err(error) = tokio::spawn(task).await {
                tracing::warn!(%error, "queued task aborted");
            }
        }
    }
}
