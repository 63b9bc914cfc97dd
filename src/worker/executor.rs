use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::config::DelayConfig;
use crate::task::TaskItem;

/// The opaque unit-of-work boundary.
///
/// The pool only assumes an executor takes a task and eventually returns;
/// what "running" means is up to the implementation. Tests substitute
/// deterministic executors for the random delay used in the binary.
#[async_trait]
pub trait WorkExecutor: Send + Sync {
    async fn execute(&self, task: &TaskItem);
}

/// Stand-in for real computation: pauses for a uniformly random duration
/// within the configured bounds. Bounds where `max_ms <= min_ms` collapse
/// to a fixed `min_ms` pause.
#[derive(Debug, Clone)]
pub struct DelayExecutor {
    config: DelayConfig,
}

impl DelayExecutor {
    pub fn new(config: DelayConfig) -> Self {
        Self { config }
    }

    fn random_delay(&self) -> Duration {
        let ms = if self.config.max_ms > self.config.min_ms {
            rand::thread_rng().gen_range(self.config.min_ms..self.config.max_ms)
        } else {
            self.config.min_ms
        };
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl WorkExecutor for DelayExecutor {
    async fn execute(&self, task: &TaskItem) {
        let delay = self.random_delay();
        tracing::debug!(
            task_id = %task.id(),
            delay_ms = delay.as_millis() as u64,
            "Pausing to simulate workload"
        );
        tokio::time::sleep(delay).await;
    }
}
