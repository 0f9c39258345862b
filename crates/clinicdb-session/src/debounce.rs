//! Cancel-and-reschedule timer keyed by logical channel.
//!
//! Scheduling a value on a channel aborts any timer still pending on that
//! channel and starts a fresh one, so a burst of edits produces a single
//! emission carrying the last value. Timers on different channels are
//! independent.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

struct Fired<K> {
    key: K,
    generation: u64,
}

struct Pending<V> {
    generation: u64,
    value: V,
    timer: JoinHandle<()>,
}

pub struct Coalescer<K, V> {
    delay: Duration,
    generation: u64,
    pending: HashMap<K, Pending<V>>,
    tx: mpsc::UnboundedSender<Fired<K>>,
    rx: mpsc::UnboundedReceiver<Fired<K>>,
}

impl<K, V> Coalescer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { delay, generation: 0, pending: HashMap::new(), tx, rx }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of channels with a timer in flight.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, key: K, value: V) {
        if let Some(previous) = self.pending.remove(&key) {
            previous.timer.abort();
        }
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let delay = self.delay;
        let fired_key = key.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away with the coalescer itself.
            let _ = tx.send(Fired { key: fired_key, generation });
        });
        self.pending.insert(key, Pending { generation, value, timer });
    }

    /// Waits for the next settled value. Returns `None` when nothing is pending.
    pub async fn next(&mut self) -> Option<(K, V)> {
        while !self.pending.is_empty() {
            let fired = self.rx.recv().await?;
            let current = self.pending.get(&fired.key).is_some_and(|p| p.generation == fired.generation);
            if current {
                let settled = self.pending.remove(&fired.key)?;
                return Some((fired.key, settled.value));
            }
            // Fired just before being replaced; the newer timer wins.
            debug!(generation = fired.generation, "dropping superseded emission");
        }
        None
    }

    /// Stops every timer and hands back the pending values in scheduling order,
    /// without waiting for their delay.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut settled: Vec<(u64, K, V)> = self
            .pending
            .drain()
            .map(|(key, p)| {
                p.timer.abort();
                (p.generation, key, p.value)
            })
            .collect();
        while self.rx.try_recv().is_ok() {}
        settled.sort_by_key(|(generation, _, _)| *generation);
        settled.into_iter().map(|(_, key, value)| (key, value)).collect()
    }

    pub fn cancel_all(&mut self) {
        let dropped = self.drain().len();
        if dropped > 0 {
            debug!(dropped, "cancelled pending emissions");
        }
    }
}

impl<K, V> Drop for Coalescer<K, V> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.timer.abort();
        }
    }
}
