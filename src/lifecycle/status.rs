//! Service check interpretation.
//!
//! Exit codes follow the LSB init-script conventions for `status`:
//! `0` running, `1`..=`3` not running (dead with pid file, dead with lock
//! file, stopped), anything else unknown.
//!
//! See <http://refspecs.linuxbase.org/LSB_3.0.0/LSB-PDA/LSB-PDA/iniscrptact.html>.

use tracing::{error, info};

use crate::error::{CommandErrorKind, LifecycleError, LifecycleResult};
use crate::executor::CommandOutput;

/// Exit codes meaning the service is definitively not running.
const NOT_RUNNING_CODES: [i32; 3] = [1, 2, 3];

/// Classify the output of a service check command.
///
/// Returns `Ok(())` when the service is running,
/// [`LifecycleError::NotRunning`] when it is definitively down, and a
/// [`CommandErrorKind::Failed`] carrying the full output otherwise.
pub fn classify_service_check(
    label: &str,
    command: &str,
    output: CommandOutput,
) -> LifecycleResult<()> {
    match output.exit_code {
        0 => {
            info!(label = %label, "Service is running");
            Ok(())
        }
        code if NOT_RUNNING_CODES.contains(&code) => {
            info!(label = %label, exit_code = code, "Service is not running");
            Err(LifecycleError::NotRunning {
                label: label.to_string(),
                exit_code: code,
            })
        }
        code => {
            error!(
                label = %label,
                command = %command,
                exit_code = code,
                "Service check failed, state unknown"
            );
            Err(LifecycleError::Command {
                kind: CommandErrorKind::Failed {
                    command: command.to_string(),
                    exit_code: code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: &str = "RabbitMQ Server";
    const CMD: &str = "service rabbitmq-server status";

    #[test]
    fn test_exit_zero_is_running() {
        assert!(classify_service_check(LABEL, CMD, CommandOutput::with_exit_code(0)).is_ok());
    }

    #[test]
    fn test_lsb_not_running_codes() {
        for code in [1, 2, 3] {
            match classify_service_check(LABEL, CMD, CommandOutput::with_exit_code(code)) {
                Err(LifecycleError::NotRunning { label, exit_code }) => {
                    assert_eq!(label, LABEL);
                    assert_eq!(exit_code, code);
                }
                other => panic!("exit code {} gave {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_other_codes_are_command_errors() {
        for code in [4, 5, 127, 255, -1] {
            let output = CommandOutput {
                exit_code: code,
                stdout: "some stdout".to_string(),
                stderr: "some stderr".to_string(),
            };
            match classify_service_check(LABEL, CMD, output) {
                Err(LifecycleError::Command {
                    kind:
                        CommandErrorKind::Failed {
                            command,
                            exit_code,
                            stdout,
                            stderr,
                        },
                }) => {
                    assert_eq!(command, CMD);
                    assert_eq!(exit_code, code);
                    assert_eq!(stdout, "some stdout");
                    assert_eq!(stderr, "some stderr");
                }
                other => panic!("exit code {} gave {:?}", code, other),
            }
        }
    }
}
