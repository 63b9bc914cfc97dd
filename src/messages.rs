use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::task::TaskItem;

/// Messages processed by the controller's sequential loop.
///
/// Everything that can mutate controller state arrives through this enum,
/// so the outstanding count and the worker ring are only ever touched by
/// one handler at a time.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Request to run a task (Driver -> Controller)
    Run(TaskItem),
    /// A worker has begun a task (Worker -> Controller). Informational;
    /// the outstanding count was already incremented at submission.
    Started { task: TaskItem, worker_id: u64 },
    /// A worker has finished a task (Worker -> Controller)
    Completed {
        task: TaskItem,
        worker_id: u64,
        elapsed: Duration,
    },
    /// Set the drain flag; terminate the pool once nothing is outstanding
    Shutdown,
    /// Point-in-time read of the outstanding count
    GetOutstandingCount(oneshot::Sender<usize>),
    /// Snapshot of pool counters
    GetStats(oneshot::Sender<PoolStats>),
}

/// Instructions sent from the controller to an individual worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run this task, then report back
    Start(TaskItem),
    /// Exit the worker loop. Issued only during drain-complete termination.
    Stop,
}

/// Lifecycle events published on the pool's broadcast stream.
///
/// Emitted by the controller loop, so subscribers observe `Dispatched`
/// events in exact round-robin assignment order.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    Dispatched { task_id: Uuid, worker_id: u64 },
    Started { task_id: Uuid, worker_id: u64 },
    Completed {
        task_id: Uuid,
        worker_id: u64,
        elapsed: Duration,
    },
    ShutdownPending,
    Terminated,
}

/// Per-worker dispatch counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: u64,
    pub dispatched: u64,
}

/// Snapshot of the pool's counters at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub submitted: u64,
    pub completed: u64,
    pub outstanding: usize,
    pub terminated: bool,
    pub workers: Vec<WorkerStats>,
}
