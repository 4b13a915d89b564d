//! Subprocess execution.
//!
//! Provides utilities for running external commands with:
//! - No shell interpretation (direct exec)
//! - Optional run-as-user via `runuser`
//! - Optional timeouts
//! - Captured stdout/stderr

use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, LifecycleError};

use super::invocation::{CommandOutput, Invocation};

/// Program used to drop privileges to another system user.
const RUNUSER: &str = "runuser";

impl CommandOutput {
    fn from_output(output: Output) -> Self {
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    user: Option<String>,
    timeout: Option<Duration>,
    /// If true, arguments will not be logged (for commands containing secrets)
    sensitive: bool,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            user: None,
            timeout: None,
            sensitive: false,
        }
    }

    /// Create a builder from an invocation description.
    pub fn from_invocation(invocation: &Invocation) -> Self {
        let mut builder = Self::new(&invocation.program).args(&invocation.args);
        for (key, value) in &invocation.env {
            builder = builder.env(key, value);
        }
        if let Some(user) = &invocation.user {
            builder = builder.user(user);
        }
        if invocation.sensitive {
            builder = builder.sensitive();
        }
        builder
    }

    /// Mark this command as containing sensitive data (e.g., passwords).
    /// When set, command arguments will not be logged.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Run the command as another system user.
    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments actually passed to exec.
    fn exec_line(&self) -> (String, Vec<String>) {
        match &self.user {
            Some(user) => {
                let mut args = vec!["-u".to_string(), user.clone(), "--".to_string()];
                args.push(self.program.clone());
                args.extend(self.args.iter().cloned());
                (RUNUSER.to_string(), args)
            }
            None => (self.program.clone(), self.args.clone()),
        }
    }

    /// Execute the command and wait for completion.
    ///
    /// A non-zero exit is not an error here; callers apply their own policy.
    /// If a timeout is set and exceeded, the process is killed and a timeout
    /// error is returned.
    pub fn run(self) -> Result<CommandOutput, LifecycleError> {
        let timeout_secs = self.timeout.map(|t| t.as_secs());
        if self.sensitive {
            debug!(
                program = %self.program,
                args = "[REDACTED]",
                user = ?self.user,
                timeout_secs = ?timeout_secs,
                "Executing subprocess (sensitive)"
            );
        } else {
            debug!(
                program = %self.program,
                args = ?self.args,
                user = ?self.user,
                timeout_secs = ?timeout_secs,
                "Executing subprocess"
            );
        }

        let (program, args) = self.exec_line();
        let mut cmd = Command::new(&program);
        cmd.args(&args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| LifecycleError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to spawn {}: {}", program, e),
            },
        })?;

        let output = match self.timeout {
            None => child.wait_with_output().map_err(|e| LifecycleError::Command {
                kind: CommandErrorKind::ExecutionFailed {
                    message: format!("Failed to get output from {}: {}", program, e),
                },
            })?,
            Some(timeout) => wait_with_timeout(child, &program, timeout, start)?,
        };

        let result = CommandOutput::from_output(output);
        debug!(
            exit_code = result.exit_code,
            duration_ms = start.elapsed().as_millis(),
            "Subprocess completed"
        );
        Ok(result)
    }
}

/// Poll a child until it exits, killing it once `timeout` has elapsed.
///
/// Both pipes are drained on reader threads while polling so a child that
/// writes more than the pipe buffer can still run to completion.
fn wait_with_timeout(
    mut child: Child,
    program: &str,
    timeout: Duration,
    start: Instant,
) -> Result<Output, LifecycleError> {
    let poll_interval = Duration::from_millis(100);
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(Output {
                    status,
                    stdout: collect(stdout, program)?,
                    stderr: collect(stderr, program)?,
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        program = %program,
                        timeout_secs = timeout.as_secs(),
                        "Process timed out, killing"
                    );
                    if let Err(e) = child.kill() {
                        warn!(error = %e, "Failed to kill timed-out process");
                    }
                    // Reap the zombie process; readers are left to finish
                    // on their own since a grandchild may still hold a pipe
                    let _ = child.wait();
                    return Err(LifecycleError::Command {
                        kind: CommandErrorKind::Timeout {
                            timeout_secs: timeout.as_secs(),
                        },
                    });
                }
                thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(LifecycleError::Command {
                    kind: CommandErrorKind::ExecutionFailed {
                        message: format!("Failed to check process status: {}", e),
                    },
                });
            }
        }
    }
}

/// Read a pipe to the end on a background thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(
    reader: Option<JoinHandle<io::Result<Vec<u8>>>>,
    program: &str,
) -> Result<Vec<u8>, LifecycleError> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    let read_failed = |message: String| LifecycleError::Command {
        kind: CommandErrorKind::ExecutionFailed {
            message: format!("Failed to get output from {}: {}", program, message),
        },
    };
    handle
        .join()
        .map_err(|_| read_failed("reader thread panicked".to_string()))?
        .map_err(|e| read_failed(e.to_string()))
}
