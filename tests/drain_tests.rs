use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use taskpool::{ControllerHandle, PoolConfig, TaskController, TaskItem, WorkExecutor};

struct NoopExecutor;

#[async_trait]
impl WorkExecutor for NoopExecutor {
    async fn execute(&self, _task: &TaskItem) {}
}

struct GateExecutor {
    gate: Semaphore,
}

impl GateExecutor {
    fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
        }
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl WorkExecutor for GateExecutor {
    async fn execute(&self, _task: &TaskItem) {
        self.gate
            .acquire()
            .await
            .expect("gate semaphore closed")
            .forget();
    }
}

fn spawn_pool(workers: usize, executor: Arc<dyn WorkExecutor>) -> ControllerHandle {
    let (controller, handle) = TaskController::new(PoolConfig::new(workers), executor);
    tokio::spawn(controller.run());
    handle
}

/// The canonical driver drain loop: request shut-down, then poll the
/// outstanding count until it reaches zero.
async fn drain(handle: &ControllerHandle) {
    handle.request_shutdown().unwrap();
    loop {
        if handle.outstanding_count().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn shutdown_with_no_outstanding_work_terminates_immediately() {
    let handle = spawn_pool(5, Arc::new(NoopExecutor));

    handle.request_shutdown().unwrap();

    // Handle messages are processed in order, so by the time this query
    // is answered the shut-down has been handled and the pool released.
    assert_eq!(handle.outstanding_count().await.unwrap(), 0);
    let stats = handle.stats().await.unwrap();
    assert!(stats.terminated);
}

#[tokio::test]
async fn shutdown_defers_until_last_completion() {
    let gate = Arc::new(GateExecutor::new());
    let handle = spawn_pool(2, gate.clone());

    handle.submit(TaskItem::new("first").unwrap()).unwrap();
    handle
        .submit(TaskItem::new("second").unwrap()).unwrap();
    assert_eq!(handle.outstanding_count().await.unwrap(), 2);

    handle.request_shutdown().unwrap();

    // Both tasks are gated, so the pool must still be alive.
    let stats = handle.stats().await.unwrap();
    assert!(!stats.terminated);
    assert_eq!(stats.outstanding, 2);

    // Finishing one task is not enough to trigger termination.
    gate.release(1);
    timeout(Duration::from_secs(5), async {
        while handle.outstanding_count().await.unwrap() > 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first completion never arrived");
    assert!(!handle.stats().await.unwrap().terminated);

    // The last completion drains the pool and termination follows.
    gate.release(1);
    timeout(Duration::from_secs(5), async {
        while !handle.stats().await.unwrap().terminated {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pool never terminated after drain");
    assert_eq!(handle.outstanding_count().await.unwrap(), 0);
}

#[tokio::test]
async fn canonical_drain_loop_observes_zero_after_termination() {
    let handle = spawn_pool(3, Arc::new(NoopExecutor));

    for n in 0..7 {
        handle
            .submit(TaskItem::new(format!("task #{n}")).unwrap()).unwrap();
    }

    timeout(Duration::from_secs(5), drain(&handle))
        .await
        .expect("drain loop did not finish");

    let stats = handle.stats().await.unwrap();
    assert!(stats.terminated);
    assert_eq!(stats.completed, 7);
    assert_eq!(stats.outstanding, 0);
}

#[tokio::test]
async fn queries_keep_working_after_the_pool_terminated() {
    let handle = spawn_pool(2, Arc::new(NoopExecutor));

    timeout(Duration::from_secs(5), drain(&handle))
        .await
        .expect("drain loop did not finish");

    // The pool is gone but the controller still answers.
    assert_eq!(handle.outstanding_count().await.unwrap(), 0);
    let stats = handle.stats().await.unwrap();
    assert!(stats.terminated);
    assert_eq!(stats.workers.len(), 2);
}

#[tokio::test]
async fn saturated_single_worker_drains_after_release() {
    let gate = Arc::new(GateExecutor::new());
    let handle = spawn_pool(1, gate.clone());

    // Pile far more work onto one worker than any buffer hint would
    // cover. Submission must queue everything without blocking, and the
    // held-open tasks must not wedge the completion path.
    for n in 0..200 {
        handle
            .submit(TaskItem::new(format!("task #{n}")).unwrap())
            .unwrap();
    }
    assert_eq!(handle.outstanding_count().await.unwrap(), 200);

    gate.release(200);
    timeout(Duration::from_secs(10), drain(&handle))
        .await
        .expect("pool failed to drain a saturated worker");

    let stats = handle.stats().await.unwrap();
    assert!(stats.terminated);
    assert_eq!(stats.completed, 200);
    assert_eq!(stats.outstanding, 0);
}

#[tokio::test]
async fn heavy_submission_burst_settles_to_zero() {
    let handle = spawn_pool(2, Arc::new(NoopExecutor));

    for n in 0..500 {
        handle
            .submit(TaskItem::new(format!("task #{n}")).unwrap())
            .unwrap();
    }

    timeout(Duration::from_secs(10), drain(&handle))
        .await
        .expect("drain loop did not finish under burst load");

    let stats = handle.stats().await.unwrap();
    assert!(stats.terminated);
    assert_eq!(stats.completed, 500);
    assert_eq!(stats.outstanding, 0);
}

#[tokio::test]
async fn repeated_shutdown_requests_are_idempotent() {
    let handle = spawn_pool(2, Arc::new(NoopExecutor));

    handle.request_shutdown().unwrap();
    handle.request_shutdown().unwrap();

    assert_eq!(handle.outstanding_count().await.unwrap(), 0);
    assert!(handle.stats().await.unwrap().terminated);
}
