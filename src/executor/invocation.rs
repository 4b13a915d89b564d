//! External invocations and their failure policy.
//!
//! Every external command the lifecycle runs is described by an
//! [`Invocation`]. Whether a non-zero exit aborts the operation is part of
//! the invocation itself ([`FailurePolicy`]), and is enforced in one place
//! by [`Invocation::check`], whichever platform actually ran the command.

use tracing::warn;

use crate::error::{CommandErrorKind, LifecycleError, LifecycleResult};

/// What to do when an invocation exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// A non-zero exit is an error.
    Check,
    /// A non-zero exit is logged and swallowed.
    Ignore,
}

/// Uniform result of an external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with the given code and printed nothing.
    pub fn with_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A single external command to run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Run as this system user instead of the current one.
    pub user: Option<String>,
    pub policy: FailurePolicy,
    /// Arguments contain secrets and must never be logged.
    pub sensitive: bool,
}

impl Invocation {
    /// Create a checked invocation of `program` with no arguments.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            user: None,
            policy: FailurePolicy::Check,
            sensitive: false,
        }
    }

    /// Run a shell command line through `sh -c`.
    ///
    /// Only for fixed command lines that need a pipeline; values from the
    /// orchestrator must go through [`Invocation::new`] and `arg`.
    pub fn shell(command_line: &str) -> Self {
        Self::new("sh").arg("-c").arg(command_line)
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Add arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Run the command as `user`.
    pub fn as_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    /// Tolerate a non-zero exit.
    pub fn ignore_failures(mut self) -> Self {
        self.policy = FailurePolicy::Ignore;
        self
    }

    /// Mark the arguments as containing secrets.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Human-readable command line, with arguments redacted when sensitive.
    pub fn command_line(&self) -> String {
        if self.sensitive {
            return format!("{} [REDACTED]", self.program);
        }
        if self.args.is_empty() {
            return self.program.clone();
        }
        format!("{} {}", self.program, self.args.join(" "))
    }

    /// Apply the failure policy to the output of this invocation.
    pub fn check(&self, output: CommandOutput) -> LifecycleResult<CommandOutput> {
        if output.success() {
            return Ok(output);
        }

        match self.policy {
            FailurePolicy::Ignore => {
                warn!(
                    command = %self.command_line(),
                    exit_code = output.exit_code,
                    "Command failed, ignoring"
                );
                Ok(output)
            }
            FailurePolicy::Check => Err(LifecycleError::Command {
                kind: CommandErrorKind::Failed {
                    command: self.command_line(),
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            }),
        }
    }
}
