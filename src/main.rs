//! rabbitmq-lifecycle - run one broker lifecycle operation for an orchestrator.

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use rabbitmq_lifecycle::audit::{
    sanitize_params, AuditEntry, AuditLog, AuditLogger, NullAuditLogger,
};
use rabbitmq_lifecycle::config::{ServiceConfig, Settings};
use rabbitmq_lifecycle::error::LifecycleError;
use rabbitmq_lifecycle::lifecycle::{LifecycleController, Operation};
use rabbitmq_lifecycle::platform::SystemPlatform;
use rabbitmq_lifecycle::services::{RabbitmqService, ServiceDefinition};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// Exit code for a status check that found the service stopped (LSB).
const EXIT_NOT_RUNNING: u8 = 3;

/// Exit code for invalid command-line usage.
const EXIT_USAGE: u8 = 2;

/// Parsed command line.
struct Args {
    operation: Operation,
    command_file: String,
    settings_path: Option<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let args = match parse_args(&args) {
        Ok(a) => a,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Run '{} --help' for usage.", NAME);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let settings = match &args.settings_path {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading settings: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!(operation = %args.operation, "{} v{}", NAME, VERSION);

    let audit = open_audit_log(&settings);
    let outcome = run(args.operation, &args.command_file, &settings, audit.as_ref());

    match outcome {
        Ok(()) => {
            info!(operation = %args.operation, "Operation completed");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_not_running() => {
            info!(operation = %args.operation, "{}", e);
            ExitCode::from(EXIT_NOT_RUNNING)
        }
        Err(e) => {
            error!(operation = %args.operation, error = %e, "Operation failed");
            ExitCode::FAILURE
        }
    }
}

/// Load the command file, run one operation and record it in the audit log.
///
/// A command file that cannot be loaded is audited as a failed operation.
fn run(
    operation: Operation,
    command_file: &str,
    settings: &Settings,
    audit: &dyn AuditLog,
) -> Result<(), LifecycleError> {
    let operation_id = Uuid::new_v4();
    let timestamp = Utc::now().to_rfc3339();
    let start = Instant::now();

    let (outcome, audited_config) = match ServiceConfig::load(command_file) {
        Ok(config) => {
            let platform = SystemPlatform::new(settings.limits.command_timeout());
            let outcome = LifecycleController::new(platform, settings)
                .and_then(|controller| controller.run(operation, &config));
            let sanitized = serde_json::to_value(&config)
                .map(|v| sanitize_params(&v))
                .unwrap_or_default();
            (outcome, sanitized)
        }
        Err(e) => {
            error!(error = %e, command_file = %command_file, "Invalid command file");
            (Err(e), serde_json::json!({ "command_file": command_file }))
        }
    };

    let entry = AuditEntry::from_outcome(
        timestamp,
        operation_id,
        RabbitmqService.name(),
        operation.as_str(),
        audited_config,
        &outcome,
        start.elapsed().as_millis() as u64,
    );
    if let Err(e) = audit.log(&entry) {
        warn!(error = %e, "Failed to write audit entry");
    }

    outcome
}

fn open_audit_log(settings: &Settings) -> Box<dyn AuditLog> {
    if !settings.audit.enabled {
        return Box::new(NullAuditLogger);
    }
    match AuditLogger::new(&settings.audit.log_path) {
        Ok(logger) => Box::new(logger),
        Err(e) => {
            warn!(
                error = %e,
                path = %settings.audit.log_path.display(),
                "Audit log unavailable, continuing without it"
            );
            Box::new(NullAuditLogger)
        }
    }
}

/// Parse `<operation> <command-file> [--settings <path>]`.
fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut settings_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--settings" || arg == "-s" {
            let path = iter
                .next()
                .ok_or_else(|| format!("{} requires a path", arg))?;
            settings_path = Some(path.clone());
        } else if let Some(path) = arg.strip_prefix("--settings=") {
            settings_path = Some(path.to_string());
        } else if arg.starts_with('-') {
            return Err(format!("unknown option '{}'", arg));
        } else {
            positional.push(arg.clone());
        }
    }

    match positional.as_slice() {
        [operation, command_file] => Ok(Args {
            operation: operation
                .parse::<Operation>()
                .map_err(|e| e.to_string())?,
            command_file: command_file.clone(),
            settings_path,
        }),
        _ => Err("expected <OPERATION> <COMMAND_FILE>".to_string()),
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
Install, configure, start, stop and health-check a RabbitMQ broker.

USAGE:
    {} <OPERATION> <COMMAND_FILE> [OPTIONS]

OPERATIONS:
    install      Register the package source, install, then start
    configure    Write rabbitmq-env.conf and rabbitmq.config
    start        Configure, start the service, provision the admin account
    stop         Stop the service
    status       Exit 0 if running, 3 if not running, 1 if unknown

ARGS:
    <COMMAND_FILE>    Orchestrator command JSON with the broker configuration

OPTIONS:
    -s, --settings <PATH>    Path to a TOML settings file [default: built-in]
    -h, --help               Print help information
    -V, --version            Print version information
"#,
        NAME, VERSION, NAME
    );
}

/// Initialize logging based on settings.
///
/// Logs go to stderr; stdout belongs to the orchestrator.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use rabbitmq_lifecycle::audit::AuditResult;

    #[derive(Default)]
    struct RecordingAudit {
        entries: RefCell<Vec<AuditEntry>>,
    }

    impl AuditLog for RecordingAudit {
        fn log(&self, entry: &AuditEntry) -> Result<(), LifecycleError> {
            self.entries.borrow_mut().push(entry.clone());
            Ok(())
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_operation_and_file() {
        let args = parse_args(&strings(&["status", "/var/lib/cmd.json"])).unwrap();
        assert_eq!(args.operation, Operation::Status);
        assert_eq!(args.command_file, "/var/lib/cmd.json");
        assert!(args.settings_path.is_none());
    }

    #[test]
    fn test_parse_settings_forms() {
        let args =
            parse_args(&strings(&["start", "cmd.json", "--settings", "/etc/s.toml"])).unwrap();
        assert_eq!(args.settings_path.as_deref(), Some("/etc/s.toml"));

        let args = parse_args(&strings(&["--settings=/etc/s.toml", "stop", "cmd.json"])).unwrap();
        assert_eq!(args.operation, Operation::Stop);
        assert_eq!(args.settings_path.as_deref(), Some("/etc/s.toml"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&strings(&["status"])).is_err());
        assert!(parse_args(&strings(&["restart", "cmd.json"])).is_err());
        assert!(parse_args(&strings(&["start", "cmd.json", "--settings"])).is_err());
        assert!(parse_args(&strings(&["start", "cmd.json", "--force"])).is_err());
        assert!(parse_args(&strings(&["start", "a.json", "b.json"])).is_err());
    }

    #[test]
    fn test_unreadable_command_file_is_audited() {
        let audit = RecordingAudit::default();
        let result = run(
            Operation::Start,
            "/nonexistent/command.json",
            &Settings::default(),
            &audit,
        );
        assert!(matches!(result, Err(LifecycleError::Config { .. })));

        let entries = audit.entries.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "start");
        assert_eq!(entries[0].service, "rabbitmq");
        assert_eq!(entries[0].config["command_file"], "/nonexistent/command.json");
        match &entries[0].result {
            AuditResult::Failure { error_code, .. } => assert_eq!(error_code, "CONFIG_ERROR"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
