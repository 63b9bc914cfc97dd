use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskPoolError {
    #[error("Task description cannot be empty or whitespace-only")]
    EmptyDescription,

    #[error("Pool closed: {0}")]
    PoolClosed(String),
}

pub type Result<T> = std::result::Result<T, TaskPoolError>;
