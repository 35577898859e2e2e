//! External command execution and outcome classification.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// One external command invocation.
#[derive(Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Text written to the child's stdin, then closed.
    pub stdin: Option<String>,
}

impl CommandSpec {
    #[must_use]
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    #[must_use]
    pub fn with_stdin(mut self, input: String) -> Self {
        self.stdin = Some(input);
        self
    }
}

// Stdin carries passwords, so only program and arguments are shown.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Everything observable about a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn last_stdout_line(&self) -> Option<&str> {
        last_non_empty_line(&self.stdout)
    }

    #[must_use]
    pub fn last_stderr_line(&self) -> Option<&str> {
        last_non_empty_line(&self.stderr)
    }
}

fn last_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rev().find(|line| !line.is_empty())
}

/// Runs a command to completion, capturing stdout and stderr.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or its output
/// cannot be collected.
pub async fn run_command(spec: &CommandSpec) -> io::Result<CommandOutput> {
    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(input)) = (pipe, spec.stdin.as_deref()) {
            pipe.write_all(input.as_bytes()).await?;
            pipe.shutdown().await?;
        }
        Ok::<(), io::Error>(())
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output?;
    // The child may exit before reading all of its input.
    if let Err(e) = fed
        && e.kind() != io::ErrorKind::BrokenPipe
    {
        return Err(e);
    }

    Ok(CommandOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Classified outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The operation succeeded; `detail` is its last output line, if any.
    Success { name: String, detail: Option<String> },

    /// The operation reported an error.
    Failure { name: String, detail: String },

    /// The operation could not be run or its task died.
    Crashed { name: String, detail: String },
}

impl TaskOutcome {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Success { name, .. } | Self::Failure { name, .. } | Self::Crashed { name, .. } => {
                name
            }
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    const fn severity(&self) -> u8 {
        match self {
            Self::Success { .. } => 0,
            Self::Failure { .. } => 1,
            Self::Crashed { .. } => 2,
        }
    }

    /// Combines the outcomes of two sequential steps on the same record.
    ///
    /// Keeps the more severe one; on a tie the later step wins.
    #[must_use]
    pub fn worse(self, later: Self) -> Self {
        if self.severity() > later.severity() {
            self
        } else {
            later
        }
    }

    /// Prefixes a failure detail with the step that produced it.
    #[must_use]
    pub fn in_step(self, step: &str) -> Self {
        match self {
            Self::Failure { name, detail } => Self::Failure {
                name,
                detail: format!("{step}: {detail}"),
            },
            Self::Crashed { name, detail } => Self::Crashed {
                name,
                detail: format!("{step}: {detail}"),
            },
            success @ Self::Success { .. } => success,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                name,
                detail: Some(detail),
            } => write!(f, "{name}: {detail}"),
            Self::Success { name, detail: None } => write!(f, "{name}: (no output)"),
            Self::Failure { name, detail } => write!(f, "failed: {name}: {detail}"),
            Self::Crashed { name, detail } => write!(f, "crashed: {name}: {detail}"),
        }
    }
}

/// Decides whether captured output means success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyPolicy {
    /// Any text on stderr is a failure; the exit status is ignored.
    #[default]
    StderrOnly,

    /// Text on stderr or a non-zero (or missing) exit status is a failure.
    Strict,
}

impl ClassifyPolicy {
    #[must_use]
    pub fn classify(self, name: &str, output: &CommandOutput) -> TaskOutcome {
        if let Some(line) = output.last_stderr_line() {
            return TaskOutcome::Failure {
                name: name.to_owned(),
                detail: line.to_owned(),
            };
        }

        if self == Self::Strict && output.status != Some(0) {
            let detail = match output.status {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_owned(),
            };
            return TaskOutcome::Failure {
                name: name.to_owned(),
                detail,
            };
        }

        TaskOutcome::Success {
            name: name.to_owned(),
            detail: output.last_stdout_line().map(str::to_owned),
        }
    }
}
