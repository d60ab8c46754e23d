//! External tool invocation
//!
//! Every build tool (the YAIL compiler, the dex merger, `aapt`, `jarsigner`,
//! `zipalign`, `javac`) runs through a [`ToolRunner`]. Commands are argv-only
//! and every invocation carries a timeout; an expired child is killed.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;

/// Tool invocation errors
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The program could not be started
    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// Waiting on the child failed
    #[error("Failed to collect output of '{program}': {reason}")]
    Io { program: String, reason: String },

    /// The child ran past its timeout and was killed
    #[error("'{program}' timed out after {timeout_seconds} seconds")]
    Timeout {
        program: String,
        timeout_seconds: u64,
    },
}

/// Argv-style command description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a command for the given program
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Program name for logs and error messages
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Space-joined rendering of the whole command line
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether any argument equals `needle`
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output
    pub stdout: Vec<u8>,
    /// Standard error
    pub stderr: Vec<u8>,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// Output of a tool that exited with `code` and printed nothing
    #[must_use]
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// Whether the tool exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout as UTF-8, lossy
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr as UTF-8, lossy
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Short description of a failure for stage error messages
    pub fn failure_reason(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr_string();
        let last = stderr.lines().rev().find(|l| !l.trim().is_empty());
        match last {
            Some(line) => format!("{status}: {}", line.trim()),
            None => status,
        }
    }
}

/// Executes tool commands
pub trait ToolRunner: Send + Sync {
    /// Run `spec` to completion, killing it after `timeout`.
    ///
    /// A non-zero exit is `Ok` with the exit code recorded; only spawn
    /// failures and timeouts are errors.
    fn run(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
    ) -> impl Future<Output = Result<ToolOutput, RunnerError>> + Send;
}

/// Runs tools as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<ToolOutput, RunnerError> {
        let program = spec.program_name();
        tracing::debug!(command = %spec.display(), "Running tool");

        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|e| RunnerError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        // Dropping the wait future drops the child, which kills it.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.status.code(),
            }),
            Ok(Err(e)) => Err(RunnerError::Io {
                program,
                reason: e.to_string(),
            }),
            Err(_) => Err(RunnerError::Timeout {
                program,
                timeout_seconds: timeout.as_secs(),
            }),
        }
    }
}
