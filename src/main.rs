//! tasker - a priority-queue reminder scheduler.
//!
//! Usage:
//!   tasker run [--config FILE]    Run the scheduler and read commands from stdin
//!   tasker validate --config FILE Validate a configuration file without running

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tasker::{
    ConsoleCommand, Event, EventBus, EventHandler, LogNotifier, Notifier, NotifyError, Reply,
    Scheduler, SchedulerConfig, YamlLoader,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

/// tasker - a priority-queue reminder scheduler
#[derive(Parser)]
#[command(name = "tasker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler, reading commands from stdin
    Run {
        /// Path to a YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Seconds between checks for queued work
        #[arg(long)]
        poll_interval: Option<f64>,

        /// Wall-clock seconds in one task minute
        #[arg(long)]
        minute_secs: Option<f64>,
    },

    /// Validate a configuration file without running
    Validate {
        /// Path to a YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
}

/// Logs scheduler events.
struct LoggingHandler;

#[async_trait::async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &Event) {
        match event {
            Event::TaskQueued {
                name,
                priority,
                sequence,
                ..
            } => {
                debug!("Task '{}' queued at priority {} ({})", name, priority, sequence);
            }
            Event::TaskStarted { name, minutes, .. } => {
                info!("Task '{}' started ({} min)", name, minutes);
            }
            Event::TaskFinished { name, elapsed, .. } => {
                info!("Task '{}' finished after {:?}", name, elapsed);
            }
            Event::TaskDiscarded {
                name,
                sequence,
                reason,
                ..
            } => {
                debug!("Dropped {:?} entry '{}' ({})", reason, name, sequence);
            }
            Event::NotificationFailed { title, error, .. } => {
                warn!("Notification '{}' was not delivered: {}", title, error);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            poll_interval,
            minute_secs,
        } => {
            run_scheduler(config, poll_interval, minute_secs).await?;
        }
        Commands::Validate { config } => {
            validate_config(config)?;
        }
    }

    Ok(())
}

/// Pick the configured notifier, falling back to the log where the platform
/// has no notification program.
fn select_notifier(config: &SchedulerConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.build_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(NotifyError::UnsupportedPlatform(os)) => {
            warn!(
                "Desktop notifications are not supported on '{}', logging them instead",
                os
            );
            Ok(Arc::new(LogNotifier::new()))
        }
        Err(e) => Err(e),
    }
}

/// Run the scheduler until stdin closes, `quit` is entered, or Ctrl+C.
async fn run_scheduler(
    config_path: Option<PathBuf>,
    poll_interval: Option<f64>,
    minute_secs: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            YamlLoader::load_config(path)?
        }
        None => SchedulerConfig::default(),
    };

    if let Some(secs) = poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(secs) = minute_secs {
        config.minute_secs = secs;
    }

    let notifier = select_notifier(&config)?;

    // Create event bus with logging handler
    let event_bus = EventBus::new();
    event_bus.register(Arc::new(LoggingHandler)).await;

    let scheduler = Scheduler::from_config(&config, notifier)?.with_event_bus(event_bus);

    info!(
        "Starting scheduler (poll interval: {}s, minute: {}s, {} task(s) queued)...",
        config.poll_interval_secs,
        config.minute_secs,
        config.tasks.len()
    );
    info!("Type 'help' for commands, 'quit' or Ctrl+C to stop");

    let (handle, scheduler_task) = scheduler.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Shutting down...");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input, shutting down...");
                    break;
                };
                match ConsoleCommand::parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => match command.execute(&handle).await {
                        Ok(Reply::Message(message)) => println!("{}", message),
                        Ok(Reply::Quit) => break,
                        Err(e) => eprintln!("{}", e),
                    },
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }

    handle.shutdown().await?;
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task failed: {}", e);
    }

    info!("Goodbye!");
    Ok(())
}

/// Validate a configuration file without running.
fn validate_config(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating configuration: {}", path.display());

    match YamlLoader::load_config(&path) {
        Ok(config) => {
            info!("Configuration is valid:");
            info!("  Notifier: {:?}", config.notifier);
            info!(
                "  Poll interval: {}s, minute: {}s",
                config.poll_interval_secs, config.minute_secs
            );
            for task in &config.tasks {
                let priority = task.priority.unwrap_or(config.default_priority);
                info!(
                    "  - {} ({} min, priority {}): OK",
                    task.title, task.minutes, priority
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}
