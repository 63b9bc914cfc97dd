pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod shutdown;
pub mod task;
pub mod worker;

pub use config::{DelayConfig, PoolConfig};
pub use controller::{ControllerHandle, TaskController};
pub use error::{Result, TaskPoolError};
pub use messages::{PoolEvent, PoolStats, WorkerStats};
pub use task::TaskItem;
pub use worker::{DelayExecutor, WorkExecutor};
