//! Interactive console commands.
//!
//! Each line read by `tasker run` is parsed as a small command line:
//!
//! ```text
//! add -d 25 -p 1 write report
//! delete write report
//! reprioritize -p 3 write report
//! list
//! quit
//! ```
//!
//! Titles are the remaining words joined by single spaces.

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::core::task::TaskSummary;
use crate::core::types::Priority;
use crate::scheduler::{SchedulerError, SchedulerHandle};

/// Errors raised by a console line.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The line is not a valid command.
    #[error("{0}")]
    Parse(#[from] clap::Error),

    /// The scheduler rejected the command.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[derive(Debug, Parser)]
#[command(name = "tasker", no_binary_name = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

/// A command typed at the console.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ConsoleCommand {
    /// Queue a task
    Add {
        /// Duration in minutes
        #[arg(short = 'd', long = "minutes", allow_negative_numbers = true)]
        minutes: f64,

        /// Priority, lower runs first (1 is the highest)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        priority: Option<u32>,

        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Delete a queued task
    #[command(alias = "rm")]
    Delete {
        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Move a queued task to another priority
    Reprioritize {
        /// New priority (1 is the highest)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        priority: u32,

        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Show the running task and the queue
    #[command(alias = "ls")]
    List,

    /// Stop the scheduler and exit
    #[command(alias = "exit")]
    Quit,
}

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Print a message and keep reading.
    Message(String),
    /// Stop reading input.
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, ConsoleError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(None);
        }
        let parsed = ConsoleLine::try_parse_from(words)?;
        Ok(Some(parsed.command))
    }

    /// Apply the command to a running scheduler.
    pub async fn execute(self, handle: &SchedulerHandle) -> Result<Reply, ConsoleError> {
        match self {
            ConsoleCommand::Add {
                minutes,
                priority,
                title,
            } => {
                let title = title.join(" ");
                match priority {
                    Some(p) => {
                        handle
                            .add_with_priority(title.as_str(), minutes, p)
                            .await?
                    }
                    None => handle.add(title.as_str(), minutes).await?,
                }
                Ok(Reply::Message(format!("Queued '{}'", title)))
            }
            ConsoleCommand::Delete { title } => {
                let title = title.join(" ");
                handle.delete(title.as_str()).await?;
                Ok(Reply::Message(format!("Deleted '{}'", title)))
            }
            ConsoleCommand::Reprioritize { priority, title } => {
                let title = title.join(" ");
                handle.reprioritize(title.as_str(), priority).await?;
                Ok(Reply::Message(format!(
                    "Moved '{}' to priority {}",
                    title,
                    Priority::new(priority)
                )))
            }
            ConsoleCommand::List => {
                let current = handle.current().await?;
                let pending = handle.pending().await?;
                Ok(Reply::Message(render_listing(current.as_ref(), &pending)))
            }
            ConsoleCommand::Quit => Ok(Reply::Quit),
        }
    }
}

fn render_listing(current: Option<&TaskSummary>, pending: &[TaskSummary]) -> String {
    let mut lines = Vec::with_capacity(pending.len() + 2);
    match current {
        Some(task) => lines.push(format!("Running: {}", describe(task))),
        None => lines.push("Running: nothing".to_string()),
    }
    if pending.is_empty() {
        lines.push("No tasks queued".to_string());
    } else {
        lines.push(format!("Queued ({}):", pending.len()));
        for (i, task) in pending.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, describe(task)));
        }
    }
    lines.join("\n")
}

fn describe(task: &TaskSummary) -> String {
    format!(
        "{} ({} min, priority {})",
        task.name, task.minutes, task.priority
    )
}
