//! External command notifier.
//!
//! [`CommandNotifier`] delivers a notification by running a program with an
//! argument template. The placeholders `{title}`, `{body}` and `{app}` are
//! substituted into each argument before the program is started.
//!
//! ```rust
//! use tasker::CommandNotifier;
//! use std::time::Duration;
//!
//! // The Linux default
//! let notifier = CommandNotifier::notify_send("tasker");
//! assert_eq!(notifier.program(), "notify-send");
//!
//! // Any other program
//! let custom = CommandNotifier::builder("wall")
//!     .arg("{title}: {body}")
//!     .timeout(Duration::from_secs(2))
//!     .build();
//! assert_eq!(custom.args(), &["{title}: {body}"]);
//! ```
//!
//! A program that hangs is killed when the timeout elapses, since the child
//! is spawned with `kill_on_drop`.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::{DEFAULT_COMMAND_TIMEOUT, Notifier, NotifyError};

/// How substituted values are escaped inside an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgEscape {
    /// Values are inserted verbatim; each argument is passed to the program
    /// directly, so no shell quoting is needed.
    #[default]
    None,
    /// Values are escaped for use inside an AppleScript string literal.
    AppleScript,
}

impl ArgEscape {
    fn apply(self, value: &str) -> String {
        match self {
            ArgEscape::None => value.to_string(),
            ArgEscape::AppleScript => value.replace('\\', "\\\\").replace('"', "\\\""),
        }
    }
}

/// A notifier that runs an external program.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    app_name: String,
    escape: ArgEscape,
    timeout: Duration,
}

impl CommandNotifier {
    /// Create a new builder for a command notifier.
    pub fn builder(program: impl Into<String>) -> CommandNotifierBuilder {
        CommandNotifierBuilder::new(program)
    }

    /// `notify-send -a <app> <title> <body>` (freedesktop notifications).
    pub fn notify_send(app_name: impl Into<String>) -> Self {
        Self::builder("notify-send")
            .app_name(app_name)
            .args(["-a", "{app}", "{title}", "{body}"])
            .build()
    }

    /// `osascript -e 'display notification ...'` (macOS Notification Center).
    pub fn osascript() -> Self {
        Self::builder("osascript")
            .arg("-e")
            .arg(r#"display notification "{body}" with title "{title}""#)
            .escape(ArgEscape::AppleScript)
            .build()
    }

    /// Get the program being executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the argument template.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the timeout duration.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arguments with placeholders substituted.
    pub fn render_args(&self, title: &str, body: &str) -> Vec<String> {
        let title = self.escape.apply(title);
        let body = self.escape.apply(body);
        let app = self.escape.apply(&self.app_name);
        self.args
            .iter()
            .map(|arg| substitute(arg, &title, &body, &app))
            .collect()
    }
}

/// Replace placeholders in one pass over the template. Substituted values
/// are never scanned again, so braces inside a title stay as typed.
fn substitute(template: &str, title: &str, body: &str, app: &str) -> String {
    let mut out = String::with_capacity(template.len() + title.len() + body.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let (value, len) = if tail.starts_with("{title}") {
            (title, "{title}".len())
        } else if tail.starts_with("{body}") {
            (body, "{body}".len())
        } else if tail.starts_with("{app}") {
            (app, "{app}".len())
        } else {
            ("{", 1)
        };
        out.push_str(value);
        rest = &tail[len..];
    }

    out.push_str(rest);
    out
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.render_args(title, body));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))?
            .map_err(|source| NotifyError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(NotifyError::CommandFailed {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Builder for creating `CommandNotifier` instances.
#[derive(Debug, Clone)]
pub struct CommandNotifierBuilder {
    program: String,
    args: Vec<String>,
    app_name: String,
    escape: ArgEscape,
    timeout: Duration,
}

impl CommandNotifierBuilder {
    /// Create a new builder with the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            app_name: "tasker".to_string(),
            escape: ArgEscape::default(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Add a single argument template.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple argument templates.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the value substituted for `{app}`.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set how substituted values are escaped.
    pub fn escape(mut self, escape: ArgEscape) -> Self {
        self.escape = escape;
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Build the `CommandNotifier`.
    pub fn build(self) -> CommandNotifier {
        CommandNotifier {
            program: self.program,
            args: self.args,
            app_name: self.app_name,
            escape: self.escape,
            timeout: self.timeout,
        }
    }
}
