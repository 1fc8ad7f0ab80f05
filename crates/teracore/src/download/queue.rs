use crate::core::metrics;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};

/// Opaque identifier of the requesting conversation (a Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(pub i64);

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One queued unit of work: a share link and the chat that asked for it.
///
/// Tasks are immutable once created and are dropped as soon as their
/// pipeline run finishes. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique task identifier (UUID), used in logs
    pub id: String,
    /// Conversation the result goes back to
    pub consumer: ConsumerId,
    /// Original share link as the user sent it
    pub reference: String,
    /// When the task was created
    pub created_at: Instant,
}

impl Task {
    /// Creates a new task with a unique ID.
    ///
    /// # Example
    ///
    /// ```
    /// use teracore::download::queue::{ConsumerId, Task};
    ///
    /// let task = Task::new(ConsumerId(42), "https://terabox.com/s/abc");
    /// assert_eq!(task.reference, "https://terabox.com/s/abc");
    /// ```
    pub fn new(consumer: ConsumerId, reference: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            consumer,
            reference: reference.into(),
            created_at: Instant::now(),
        }
    }
}

/// Something that runs one task to completion.
///
/// `process` must handle its own failures; whatever it returns, the worker
/// moves on to the next task.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    /// Runs one task to a terminal state.
    async fn process(&self, task: &Task);

    /// Called when `process` panicked for this task.
    async fn on_panic(&self, _task: &Task) {}
}

/// Pending list and worker flag; only ever touched under `TaskQueue::state`.
#[derive(Default)]
struct QueueState {
    pending: VecDeque<Task>,
    worker_active: bool,
}

/// Unbounded FIFO of tasks drained by at most one lazily started worker.
///
/// `enqueue` appends and, if no worker is running, starts one. The worker pops
/// tasks one at a time and processes each to completion before the next.
/// When it finds the list empty it clears the flag and exits, inside the same
/// critical section, so an enqueue racing with that check either lands before
/// it (and is popped) or sees the flag cleared (and starts a new worker).
pub struct TaskQueue {
    state: Mutex<QueueState>,
    processor: Arc<dyn TaskProcessor>,
    idle: Notify,
    live_workers: AtomicUsize,
    peak_workers: AtomicUsize,
    worker_starts: AtomicU64,
}

impl TaskQueue {
    /// Creates an idle queue feeding `processor`.
    pub fn new(processor: Arc<dyn TaskProcessor>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            processor,
            idle: Notify::new(),
            live_workers: AtomicUsize::new(0),
            peak_workers: AtomicUsize::new(0),
            worker_starts: AtomicU64::new(0),
        })
    }

    /// Appends a task and returns its 1-based position in the pending list.
    pub async fn enqueue(self: &Arc<Self>, task: Task) -> usize {
        self.enqueue_all(std::iter::once(task)).await
    }

    /// Appends tasks contiguously, in iteration order, and returns the new pending length.
    ///
    /// Starts the worker if the queue was idle.
    pub async fn enqueue_all<I>(self: &Arc<Self>, tasks: I) -> usize
    where
        I: IntoIterator<Item = Task>,
    {
        let mut state = self.state.lock().await;
        for task in tasks {
            log::info!(
                "Queueing task {} for consumer {}: {}",
                task.id,
                task.consumer,
                task.reference
            );
            state.pending.push_back(task);
        }
        let depth = state.pending.len();
        metrics::update_queue_depth(depth);

        if !state.worker_active && depth > 0 {
            state.worker_active = true;
            self.worker_starts.fetch_add(1, Ordering::Relaxed);
            log::debug!("Queue idle -> draining, starting worker ({} pending)", depth);
            tokio::spawn(Arc::clone(self).run_worker());
        }

        depth
    }

    /// Number of tasks waiting (not counting the one being processed).
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Whether nothing is waiting.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }

    /// Whether a worker is currently draining the queue.
    pub async fn is_draining(&self) -> bool {
        self.state.lock().await.worker_active
    }

    /// How many times a worker has been started since creation.
    pub fn worker_starts(&self) -> u64 {
        self.worker_starts.load(Ordering::Relaxed)
    }

    /// Waits until the queue is idle: no worker running and nothing pending.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.state.lock().await;
                if !state.worker_active && state.pending.is_empty() {
                    return;
                }
            }

            notified.await;
        }
    }

    async fn run_worker(self: Arc<Self>) {
        let live = self.live_workers.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_workers.fetch_max(live, Ordering::SeqCst);
        if live > 1 {
            log::error!("{} queue workers active at once", live);
        }

        loop {
            let task = {
                let mut state = self.state.lock().await;
                match state.pending.pop_front() {
                    Some(task) => {
                        metrics::update_queue_depth(state.pending.len());
                        task
                    }
                    None => {
                        state.worker_active = false;
                        self.live_workers.fetch_sub(1, Ordering::SeqCst);
                        self.idle.notify_waiters();
                        log::debug!("Queue drained, worker going idle");
                        return;
                    }
                }
            };

            self.process_one(task).await;
        }
    }

    /// Runs one task behind its own panic boundary.
    async fn process_one(&self, task: Task) {
        log::info!(
            "Processing task {} (waited {:.2}s): {}",
            task.id,
            task.created_at.elapsed().as_secs_f64(),
            task.reference
        );

        let outcome = AssertUnwindSafe(self.processor.process(&task)).catch_unwind().await;
        if outcome.is_err() {
            log::error!("Task {} panicked while processing {}", task.id, task.reference);
            metrics::record_task_outcome("panic");
            if AssertUnwindSafe(self.processor.on_panic(&task))
                .catch_unwind()
                .await
                .is_err()
            {
                log::error!("Panic handler for task {} panicked as well", task.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    /// Records references in processing order and checks nothing overlaps.
    #[derive(Default)]
    struct Recorder {
        seen: std::sync::Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        overlap: AtomicUsize,
    }

    #[async_trait]
    impl TaskProcessor for Recorder {
        async fn process(&self, task: &Task) {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlap.fetch_add(1, Ordering::SeqCst);
            }
            tokio::task::yield_now().await;
            if task.reference.contains("panic") {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("boom");
            }
            self.seen.lock().unwrap().push(task.reference.clone());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn task(reference: &str) -> Task {
        Task::new(ConsumerId(1), reference)
    }

    #[test]
    fn test_task_new_generates_unique_ids() {
        let a = task("a");
        let b = task("a");
        assert_ne!(a.id, b.id);
        assert_eq!(a.consumer, ConsumerId(1));
    }

    #[tokio::test]
    async fn test_empty_queue_is_idle() {
        let queue = TaskQueue::new(Arc::new(Recorder::default()));
        assert!(queue.is_empty().await);
        assert!(!queue.is_draining().await);
        assert_eq!(queue.worker_starts(), 0);
        tokio::time::timeout(Duration::from_secs(1), queue.wait_idle())
            .await
            .expect("idle queue returns immediately");
    }

    #[tokio::test]
    async fn test_processes_in_fifo_order() {
        let recorder = Arc::new(Recorder::default());
        let queue = TaskQueue::new(recorder.clone());

        for reference in ["a", "b", "c", "d"] {
            queue.enqueue(task(reference)).await;
        }
        queue.wait_idle().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(recorder.overlap.load(Ordering::SeqCst), 0);
        assert!(!queue.is_draining().await);
    }

    #[tokio::test]
    async fn test_enqueue_all_keeps_batch_order() {
        let recorder = Arc::new(Recorder::default());
        let queue = TaskQueue::new(recorder.clone());

        let depth = queue.enqueue_all(vec![task("x"), task("y"), task("z")]).await;
        assert!(depth >= 1);
        queue.wait_idle().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_the_worker() {
        let recorder = Arc::new(Recorder::default());
        let queue = TaskQueue::new(recorder.clone());

        queue
            .enqueue_all(vec![task("first"), task("panic-me"), task("third")])
            .await;
        queue.wait_idle().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_worker_restarts_after_idle() {
        let recorder = Arc::new(Recorder::default());
        let queue = TaskQueue::new(recorder.clone());

        queue.enqueue(task("one")).await;
        queue.wait_idle().await;
        queue.enqueue(task("two")).await;
        queue.wait_idle().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["one", "two"]);
        assert_eq!(queue.worker_starts(), 2);
        assert_eq!(queue.peak_workers.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_worker_under_concurrent_enqueues() {
        let recorder = Arc::new(Recorder::default());
        let queue = TaskQueue::new(recorder.clone());

        let mut producers = Vec::new();
        for p in 0..16 {
            let queue = Arc::clone(&queue);
            producers.push(tokio::spawn(async move {
                for i in 0..50 {
                    queue.enqueue(task(&format!("{}-{}", p, i))).await;
                    if i % 7 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        queue.wait_idle().await;

        assert_eq!(recorder.seen.lock().unwrap().len(), 16 * 50);
        assert_eq!(recorder.overlap.load(Ordering::SeqCst), 0);
        assert_eq!(queue.peak_workers.load(Ordering::SeqCst), 1);
        assert_eq!(queue.live_workers.load(Ordering::SeqCst), 0);
    }
}
