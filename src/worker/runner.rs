use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::messages::{ControllerMessage, WorkerMessage};
use crate::worker::WorkExecutor;

/// A sequential executor of tasks, one at a time.
///
/// The worker holds a non-owning sender back to its controller, used only
/// for start/completion notifications; the channel is unbounded so a
/// notification never waits on mailbox capacity (a worker can have at most
/// two notifications in flight). The loop is strictly sequential: the next
/// instruction is not read until the current task's completion
/// notification has been sent.
pub struct Worker {
    id: u64,
    rx: mpsc::UnboundedReceiver<WorkerMessage>,
    controller: mpsc::UnboundedSender<ControllerMessage>,
    executor: Arc<dyn WorkExecutor>,
}

impl Worker {
    pub fn new(
        id: u64,
        rx: mpsc::UnboundedReceiver<WorkerMessage>,
        controller: mpsc::UnboundedSender<ControllerMessage>,
        executor: Arc<dyn WorkExecutor>,
    ) -> Self {
        Self {
            id,
            rx,
            controller,
            executor,
        }
    }

    /// Run the worker loop until a stop instruction arrives or the
    /// controller drops the channel.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                WorkerMessage::Start(task) => {
                    tracing::debug!(
                        worker_id = self.id,
                        task_id = %task.id(),
                        description = task.description(),
                        "Worker is starting task"
                    );
                    if self
                        .controller
                        .send(ControllerMessage::Started {
                            task: task.clone(),
                            worker_id: self.id,
                        })
                        .is_err()
                    {
                        // Controller gone; nothing left to report to.
                        break;
                    }

                    let started = Instant::now();
                    self.executor.execute(&task).await;
                    let elapsed = started.elapsed();

                    tracing::debug!(
                        worker_id = self.id,
                        task_id = %task.id(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Worker has completed task"
                    );
                    if self
                        .controller
                        .send(ControllerMessage::Completed {
                            task,
                            worker_id: self.id,
                            elapsed,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                WorkerMessage::Stop => {
                    tracing::debug!(worker_id = self.id, "Worker stopping");
                    break;
                }
            }
        }
    }
}
