/// Bounds for the simulated workload delay.
///
/// The stand-in executor pauses for a uniformly random duration within
/// `[min_ms, max_ms)` for each task it "runs". If `max_ms <= min_ms` the
/// delay collapses to a fixed `min_ms` pause; the CLI rejects inverted
/// bounds before a pool is ever built.
#[derive(Debug, Clone)]
pub struct DelayConfig {
    /// Lower bound of the simulated delay, in milliseconds (inclusive)
    pub min_ms: u64,
    /// Upper bound of the simulated delay, in milliseconds (exclusive)
    pub max_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: 100,
            max_ms: 350,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of workers created at pool construction.
    /// This is the maximum concurrency of the pool.
    pub worker_count: usize,
    /// Capacity of the broadcast event stream. Slow subscribers that lag
    /// past this many events lose the oldest ones.
    pub event_capacity: usize,
    pub delay: DelayConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            event_capacity: 256,
            delay: DelayConfig::default(),
        }
    }
}

impl PoolConfig {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.delay = DelayConfig { min_ms, max_ms };
        self
    }
}
