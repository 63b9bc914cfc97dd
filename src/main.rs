use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use taskpool::shutdown::drain_interrupt_token;
use taskpool::{
    ControllerHandle, DelayExecutor, PoolConfig, PoolEvent, PoolStats, TaskController, TaskItem,
};

#[derive(Parser, Debug)]
#[command(name = "taskpool")]
#[command(version)]
#[command(about = "A bounded worker-pool task dispatcher with round-robin assignment")]
struct Args {
    /// Number of workers in the pool
    #[arg(long, default_value = "5")]
    workers: usize,

    /// Number of tasks to submit before draining
    #[arg(long, default_value = "20")]
    tasks: u32,

    /// Minimum simulated task duration in milliseconds
    #[arg(long, default_value = "100")]
    min_delay_ms: u64,

    /// Maximum simulated task duration in milliseconds (exclusive)
    #[arg(long, default_value = "350")]
    max_delay_ms: u64,

    /// Drain-poll interval in milliseconds
    #[arg(long, default_value = "500")]
    poll_interval_ms: u64,

    /// Print the final run summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    wall_time_ms: u64,
    #[serde(flatten)]
    stats: PoolStats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.max_delay_ms <= args.min_delay_ms {
        return Err(format!(
            "--max-delay-ms ({}) must be greater than --min-delay-ms ({})",
            args.max_delay_ms, args.min_delay_ms
        )
        .into());
    }

    let config = PoolConfig::new(args.workers).with_delay(args.min_delay_ms, args.max_delay_ms);
    let executor = Arc::new(DelayExecutor::new(config.delay.clone()));
    let (controller, handle) = TaskController::new(config, executor);
    tokio::spawn(controller.run());

    spawn_reporter(&handle);

    let started = Instant::now();
    tracing::info!(task_count = args.tasks, "Submitting tasks to the controller");
    for n in 1..=args.tasks {
        let task = TaskItem::new(format!("do something #{n}"))?;
        handle.submit(task)?;
    }

    tracing::info!("Requesting controller shut-down");
    handle.request_shutdown()?;

    // Canonical drain loop: poll the outstanding count until it reaches
    // zero, at which point the pool has already terminated. A signal
    // abandons the wait instead of forcing in-flight tasks to stop.
    let token = drain_interrupt_token();
    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    loop {
        let outstanding = handle.outstanding_count().await?;
        if outstanding == 0 {
            break;
        }
        tracing::debug!(outstanding, "Waiting for outstanding tasks to drain");
        tokio::select! {
            _ = token.cancelled() => {
                tracing::warn!(outstanding, "Drain wait interrupted by signal");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }

    let summary = RunSummary {
        wall_time_ms: started.elapsed().as_millis() as u64,
        stats: handle.stats().await?,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Ran {} tasks across {} workers in {} ms ({} completed, {} still outstanding)",
            summary.stats.submitted,
            summary.stats.workers.len(),
            summary.wall_time_ms,
            summary.stats.completed,
            summary.stats.outstanding,
        );
        for w in &summary.stats.workers {
            println!("  worker {}: {} tasks", w.worker_id, w.dispatched);
        }
    }

    Ok(())
}

/// Log task lifecycle events from the pool's broadcast stream.
fn spawn_reporter(handle: &ControllerHandle) {
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PoolEvent::Started { task_id, worker_id }) => {
                    tracing::info!(
                        target: "taskpool::reporter",
                        %task_id,
                        worker_id,
                        "Task started by worker"
                    );
                }
                Ok(PoolEvent::Terminated) => {
                    tracing::info!(target: "taskpool::reporter", "Pool terminated");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Reporter lagged behind the event stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
