//! Task controller: the single point of submission for work.
//!
//! The controller owns a fixed pool of workers created eagerly at
//! construction and hides the pool topology from callers. All state
//! (outstanding count, assignment ring, drain flag) is mutated only by the
//! controller's own sequential message loop, so no locks are needed.
//!
//! # Channel topology
//!
//! The controller's mailbox and the per-worker channels are unbounded, so
//! no send in the submission or notification path ever waits for channel
//! capacity. That rules out the cycle where the controller waits on a full
//! worker channel while the workers wait on a full controller channel:
//! submission queues without rejecting, and worker notifications are
//! naturally bounded at two in-flight messages per worker.
//!
//! # Shutdown protocol
//!
//! `Shutdown` sets the drain flag. Once the outstanding count reaches zero
//! (immediately, if nothing is in flight) the controller stops every
//! worker and releases the pool. The message loop itself keeps running to
//! answer count/stats queries until every [`ControllerHandle`] is dropped,
//! so a driver polling the outstanding count observes zero only after the
//! pool has actually terminated.

pub mod ring;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::error::{Result, TaskPoolError};
use crate::messages::{ControllerMessage, PoolEvent, PoolStats, WorkerMessage, WorkerStats};
use crate::task::TaskItem;
use crate::worker::{WorkExecutor, Worker};
use ring::WorkerRing;

/// Cloneable handle used to talk to a running [`TaskController`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<ControllerMessage>,
    events: broadcast::Sender<PoolEvent>,
}

impl ControllerHandle {
    /// Submit a task for dispatch.
    ///
    /// Never blocks the caller: the task is queued on the controller's
    /// mailbox. The task itself is already validated; this only fails if
    /// the controller loop has exited.
    pub fn submit(&self, task: TaskItem) -> Result<()> {
        self.tx
            .send(ControllerMessage::Run(task))
            .map_err(|_| TaskPoolError::PoolClosed("controller loop has exited".to_string()))
    }

    /// Request a graceful shutdown: no new work is accepted, in-flight
    /// tasks run to completion, then the worker pool is released.
    pub fn request_shutdown(&self) -> Result<()> {
        self.tx
            .send(ControllerMessage::Shutdown)
            .map_err(|_| TaskPoolError::PoolClosed("controller loop has exited".to_string()))
    }

    /// Point-in-time read of the number of accepted-but-not-completed
    /// tasks. Never negative; zero after the pool has drained.
    pub async fn outstanding_count(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ControllerMessage::GetOutstandingCount(reply_tx))
            .map_err(|_| TaskPoolError::PoolClosed("controller loop has exited".to_string()))?;
        reply_rx
            .await
            .map_err(|_| TaskPoolError::PoolClosed("controller dropped the reply".to_string()))
    }

    /// Snapshot of the pool's lifetime counters.
    pub async fn stats(&self) -> Result<PoolStats> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ControllerMessage::GetStats(reply_tx))
            .map_err(|_| TaskPoolError::PoolClosed("controller loop has exited".to_string()))?;
        reply_rx
            .await
            .map_err(|_| TaskPoolError::PoolClosed("controller dropped the reply".to_string()))
    }

    /// Subscribe to the pool's lifecycle event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }
}

/// Owner and dispatcher of a fixed worker pool.
pub struct TaskController {
    rx: mpsc::UnboundedReceiver<ControllerMessage>,
    events: broadcast::Sender<PoolEvent>,
    ring: WorkerRing,
    worker_handles: Vec<JoinHandle<()>>,
    outstanding: usize,
    submitted: u64,
    completed: u64,
    shutdown_pending: bool,
    terminated: bool,
    /// Dispatch counters preserved across pool termination so stats
    /// queries keep working after the ring is released
    final_worker_stats: Vec<WorkerStats>,
}

impl TaskController {
    /// Create a controller and eagerly spawn its worker pool.
    ///
    /// Every worker is created here; none are created on demand later.
    /// The returned controller must be driven with [`TaskController::run`].
    pub fn new(
        config: PoolConfig,
        executor: Arc<dyn WorkExecutor>,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity);

        let mut ring = WorkerRing::new();
        let mut worker_handles = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count as u64 {
            let (worker_tx, worker_rx) = mpsc::unbounded_channel();
            let worker = Worker::new(worker_id, worker_rx, tx.clone(), executor.clone());
            worker_handles.push(tokio::spawn(worker.run()));
            ring.push(worker_id, worker_tx);
        }
        tracing::info!(
            worker_count = config.worker_count,
            "Worker pool configured"
        );

        let controller = Self {
            rx,
            events: events.clone(),
            ring,
            worker_handles,
            outstanding: 0,
            submitted: 0,
            completed: 0,
            shutdown_pending: false,
            terminated: false,
            final_worker_stats: Vec::new(),
        };
        let handle = ControllerHandle { tx, events };
        (controller, handle)
    }

    /// Run the controller's message loop.
    ///
    /// Processes one message at a time, which is the only serialization
    /// the outstanding count and the ring need. Exits once every handle
    /// and worker sender has been dropped.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ControllerMessage::Run(task) => self.on_run(task),
                ControllerMessage::Started { task, worker_id } => self.on_started(task, worker_id),
                ControllerMessage::Completed {
                    task,
                    worker_id,
                    elapsed,
                } => self.on_completed(task, worker_id, elapsed).await,
                ControllerMessage::Shutdown => self.on_shutdown().await,
                ControllerMessage::GetOutstandingCount(reply) => {
                    let _ = reply.send(self.outstanding);
                }
                ControllerMessage::GetStats(reply) => {
                    let _ = reply.send(self.stats_snapshot());
                }
            }
        }
        tracing::debug!("Controller loop stopped");
    }

    fn on_run(&mut self, task: TaskItem) {
        if self.shutdown_pending || self.terminated {
            tracing::warn!(
                task_id = %task.id(),
                description = task.description(),
                "Rejecting task, shut-down is pending"
            );
            return;
        }

        // The item becomes outstanding when it is accepted for dispatch,
        // not when the worker acknowledges it.
        self.outstanding += 1;
        self.submitted += 1;

        let Some(slot) = self.ring.rotate() else {
            // Unreachable while not terminated; keep the count honest anyway.
            self.outstanding -= 1;
            self.submitted -= 1;
            tracing::error!(task_id = %task.id(), "No workers in the ring, dropping task");
            return;
        };
        let worker_id = slot.id;

        tracing::info!(
            task_id = %task.id(),
            description = task.description(),
            worker_id,
            outstanding = self.outstanding,
            "Task accepted for dispatch"
        );

        if slot.tx.send(WorkerMessage::Start(task.clone())).is_err() {
            // A worker that dropped its channel is a crashed worker; there
            // is no restart policy, so surface it loudly and keep the
            // count consistent.
            self.outstanding -= 1;
            self.submitted -= 1;
            tracing::error!(
                task_id = %task.id(),
                worker_id,
                "Worker channel closed, task dropped"
            );
            return;
        }
        slot.dispatched += 1;

        self.emit(PoolEvent::Dispatched {
            task_id: task.id(),
            worker_id,
        });
    }

    fn on_started(&mut self, task: TaskItem, worker_id: u64) {
        // Informational only; the count already moved at submission.
        tracing::info!(
            task_id = %task.id(),
            description = task.description(),
            worker_id,
            outstanding = self.outstanding,
            "Task started"
        );
        self.emit(PoolEvent::Started {
            task_id: task.id(),
            worker_id,
        });
    }

    async fn on_completed(&mut self, task: TaskItem, worker_id: u64, elapsed: std::time::Duration) {
        if self.outstanding == 0 {
            // Protocol fault: a completion for something never dispatched.
            // Log and ignore rather than corrupting the count.
            tracing::error!(
                task_id = %task.id(),
                worker_id,
                "Completion for a task that was never dispatched, ignoring"
            );
            return;
        }
        self.outstanding -= 1;
        self.completed += 1;

        tracing::info!(
            task_id = %task.id(),
            description = task.description(),
            worker_id,
            elapsed_ms = elapsed.as_millis() as u64,
            age_ms = (chrono::Utc::now() - task.created_at()).num_milliseconds(),
            outstanding = self.outstanding,
            "Task completed"
        );
        self.emit(PoolEvent::Completed {
            task_id: task.id(),
            worker_id,
            elapsed,
        });

        if self.shutdown_pending {
            self.terminate_if_drained().await;
        }
    }

    async fn on_shutdown(&mut self) {
        if self.shutdown_pending {
            tracing::debug!("Shut-down already pending");
            return;
        }
        self.shutdown_pending = true;
        tracing::warn!(
            outstanding = self.outstanding,
            "Shut-down is now pending"
        );
        self.emit(PoolEvent::ShutdownPending);
        self.terminate_if_drained().await;
    }

    /// Stop every worker and release the pool, but only once nothing is
    /// outstanding. In-flight tasks are never cancelled, only waited for.
    async fn terminate_if_drained(&mut self) {
        if self.outstanding != 0 || self.terminated {
            return;
        }

        tracing::warn!("No outstanding tasks, shutting down the worker pool");
        self.final_worker_stats = self.ring.stats();
        for slot in self.ring.drain() {
            if slot.tx.send(WorkerMessage::Stop).is_err() {
                tracing::warn!(worker_id = slot.id, "Worker already gone at shut-down");
            }
        }
        for handle in self.worker_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task failed to join");
            }
        }
        self.terminated = true;
        self.emit(PoolEvent::Terminated);
        tracing::info!(
            submitted = self.submitted,
            completed = self.completed,
            "Worker pool terminated"
        );
    }

    fn stats_snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted,
            completed: self.completed,
            outstanding: self.outstanding,
            terminated: self.terminated,
            workers: if self.terminated {
                self.final_worker_stats.clone()
            } else {
                self.ring.stats()
            },
        }
    }

    fn emit(&self, event: PoolEvent) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.events.send(event);
    }
}
