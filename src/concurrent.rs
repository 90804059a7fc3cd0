use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::generator::Target;
use crate::output::ProbeResult;
use crate::probe::Prober;
use crate::queue::{self, QueueConsumer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Running,
    Draining,
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Fixed-size worker pool draining a target stream through a [`Prober`].
pub struct ProbeDispatcher<P> {
    prober: Arc<P>,
    workers: usize,
    queue_capacity: usize,
    timeout: Duration,
    state: DispatchState,
}

impl<P: Prober + 'static> ProbeDispatcher<P> {
    pub fn new(prober: Arc<P>, workers: usize, timeout: Duration) -> Self {
        let workers = workers.max(1);
        Self {
            prober,
            workers,
            queue_capacity: workers,
            timeout,
            state: DispatchState::Idle,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Feed every target to the workers and wait until all of them have
    /// drained the closed queue. Failed probes produce no result.
    ///
    /// `results` must be read concurrently: workers wait on a full channel.
    pub async fn run<I>(&mut self, targets: I, results: mpsc::Sender<ProbeResult>) -> DispatchStats
    where
        I: IntoIterator<Item = Target>,
    {
        let (producer, consumer) = queue::bounded(self.queue_capacity);
        let counters = Arc::new(Counters::default());

        self.transition(DispatchState::Running);
        let mut tasks = JoinSet::new();
        for id in 0..self.workers {
            tasks.spawn(worker(
                id,
                consumer.clone(),
                self.prober.clone(),
                self.timeout,
                results.clone(),
                counters.clone(),
            ));
        }
        drop(consumer);
        drop(results);

        let mut dispatched = 0;
        for target in targets {
            if let Err(e) = producer.push(target).await {
                tracing::error!(error=%e, "workers exited early, stopping dispatch");
                break;
            }
            dispatched += 1;
        }
        producer.close();

        self.transition(DispatchState::Draining);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error=%e, "probe worker aborted");
            }
        }
        self.transition(DispatchState::Done);

        DispatchStats {
            dispatched,
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }

    fn transition(&mut self, next: DispatchState) {
        tracing::debug!(from=?self.state, to=?next, workers=self.workers, "dispatcher state");
        self.state = next;
    }
}

async fn worker<P: Prober>(
    id: usize,
    queue: QueueConsumer<Target>,
    prober: Arc<P>,
    timeout: Duration,
    results: mpsc::Sender<ProbeResult>,
    counters: Arc<Counters>,
) {
    while let Some(target) = queue.pop().await {
        match prober.probe(&target, timeout).await {
            Ok(status) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                if results.send(ProbeResult::new(status, target)).await.is_err() {
                    tracing::warn!(worker = id, "result receiver closed");
                }
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(worker = id, error = %e, host = %target.host, "probe failed");
            }
        }
    }
    tracing::trace!(worker = id, "queue closed, worker done");
}
