//! The real host platform.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{chown, PermissionsExt};
use std::path::Path;
use std::time::Duration;

use nix::unistd::{Group, User};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LifecycleError, LifecycleResult};
use crate::executor::{CommandOutput, Invocation, SubprocessBuilder};

use super::traits::Platform;

/// Permissions of managed configuration files.
const CONFIG_FILE_MODE: u32 = 0o644;

/// Login shell for the broker system user.
const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";

/// Runs commands and touches files on the local host.
#[derive(Debug, Clone, Default)]
pub struct SystemPlatform {
    command_timeout: Option<Duration>,
}

impl SystemPlatform {
    /// Create a platform that kills commands running longer than `command_timeout`.
    pub fn new(command_timeout: Option<Duration>) -> Self {
        Self { command_timeout }
    }

    fn run_checked(&self, invocation: Invocation) -> LifecycleResult<CommandOutput> {
        let output = self.execute(&invocation)?;
        invocation.check(output)
    }
}

impl Platform for SystemPlatform {
    fn execute(&self, invocation: &Invocation) -> LifecycleResult<CommandOutput> {
        SubprocessBuilder::from_invocation(invocation)
            .timeout(self.command_timeout)
            .run()
    }

    fn ensure_user(&self, name: &str, groups: &[String]) -> LifecycleResult<()> {
        for group in groups {
            if lookup_group(name, group)?.is_none() {
                info!(group = %group, "Creating system group");
                self.run_checked(Invocation::new("groupadd").arg("--system").arg(group))?;
            }
        }

        let Some(user) = lookup_user(name)? else {
            info!(user = %name, groups = ?groups, "Creating system user");
            let mut useradd = Invocation::new("useradd")
                .args(["--system", "--no-create-home", "--shell", NOLOGIN_SHELL]);
            if let Some((primary, supplementary)) = groups.split_first() {
                useradd = useradd.args(["--gid", primary.as_str()]);
                if !supplementary.is_empty() {
                    useradd = useradd.args(["--groups", supplementary.join(",").as_str()]);
                }
            }
            self.run_checked(useradd.arg(name))?;
            return Ok(());
        };

        let mut missing = Vec::new();
        for group_name in groups {
            let group = lookup_group(name, group_name)?.ok_or_else(|| LifecycleError::User {
                name: name.to_string(),
                message: format!("group '{}' disappeared", group_name),
            })?;
            if group.gid != user.gid && !group.mem.iter().any(|m| m == name) {
                missing.push(group_name.as_str());
            }
        }

        if missing.is_empty() {
            debug!(user = %name, "System user already present");
            return Ok(());
        }

        info!(user = %name, groups = ?missing, "Adding system user to groups");
        self.run_checked(
            Invocation::new("usermod")
                .args(["--append", "--groups", missing.join(",").as_str()])
                .arg(name),
        )?;
        Ok(())
    }

    fn write_file(
        &self,
        path: &Path,
        content: &str,
        owner: &str,
        group: &str,
    ) -> LifecycleResult<()> {
        let file_error = |message: String| LifecycleError::File {
            path: path.to_path_buf(),
            message,
        };

        let uid = lookup_user(owner)?
            .ok_or_else(|| file_error(format!("unknown owner '{}'", owner)))?
            .uid;
        let gid = lookup_group(owner, group)?
            .ok_or_else(|| file_error(format!("unknown group '{}'", group)))?
            .gid;

        debug!(
            path = %path.display(),
            content_len = content.len(),
            owner = %owner,
            group = %group,
            "Writing file"
        );

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| file_error(format!("failed to create parent directory: {}", e)))?;
            }
        }

        // Write to a uniquely named sibling, then rename over the target
        let temp_name = format!(
            ".{}.{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            Uuid::new_v4().simple()
        );
        let temp_path = path.with_file_name(temp_name);

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .map_err(|e| file_error(format!("failed to create temp file: {}", e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| file_error(format!("failed to write content: {}", e)))?;
            file.sync_all()
                .map_err(|e| file_error(format!("failed to sync file: {}", e)))?;

            fs::set_permissions(&temp_path, fs::Permissions::from_mode(CONFIG_FILE_MODE))
                .map_err(|e| file_error(format!("failed to set permissions: {}", e)))?;
            chown(&temp_path, Some(uid.as_raw()), Some(gid.as_raw()))
                .map_err(|e| file_error(format!("failed to set ownership: {}", e)))?;

            fs::rename(&temp_path, path)
                .map_err(|e| file_error(format!("failed to rename temp file: {}", e)))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result?;

        info!(path = %path.display(), bytes = content.len(), "File written");
        Ok(())
    }
}

fn lookup_user(name: &str) -> LifecycleResult<Option<User>> {
    User::from_name(name).map_err(|e| LifecycleError::User {
        name: name.to_string(),
        message: format!("user lookup failed: {}", e),
    })
}

fn lookup_group(user: &str, group: &str) -> LifecycleResult<Option<Group>> {
    Group::from_name(group).map_err(|e| LifecycleError::User {
        name: user.to_string(),
        message: format!("group '{}' lookup failed: {}", group, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{getgid, getuid};

    fn current_user_and_group() -> (String, String) {
        let user = User::from_uid(getuid()).unwrap().unwrap();
        let group = Group::from_gid(getgid()).unwrap().unwrap();
        (user.name, group.name)
    }

    #[test]
    fn test_execute_returns_non_zero_as_output() {
        let platform = SystemPlatform::default();
        let output = platform
            .execute(&Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 4"]))
            .unwrap();
        assert_eq!(output.exit_code, 4);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_execute_passes_env() {
        let platform = SystemPlatform::default();
        let output = platform
            .execute(
                &Invocation::shell("echo $DEBIAN_FRONTEND").env("DEBIAN_FRONTEND", "noninteractive"),
            )
            .unwrap();
        assert_eq!(output.stdout.trim(), "noninteractive");
    }

    #[test]
    fn test_execute_applies_timeout() {
        let platform = SystemPlatform::new(Some(Duration::from_millis(200)));
        let result = platform.execute(&Invocation::new("sleep").arg("5"));
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_existing_user_runs_nothing() {
        let (user, group) = current_user_and_group();
        let platform = SystemPlatform::default();
        assert!(platform.ensure_user(&user, &[group]).is_ok());
    }

    #[test]
    fn test_write_file_creates_and_overwrites() {
        let (user, group) = current_user_and_group();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/rabbitmq-env.conf");
        let platform = SystemPlatform::default();

        platform.write_file(&path, "NODE_PORT=5672\n", &user, &group).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "NODE_PORT=5672\n");

        platform.write_file(&path, "NODE_PORT=5673\n", &user, &group).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "NODE_PORT=5673\n");

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, CONFIG_FILE_MODE);

        // No temp files left behind
        let entries = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_file_unknown_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rabbitmq.config");
        let result = SystemPlatform::default().write_file(
            &path,
            "[].",
            "no_such_user_12345",
            "no_such_group_12345",
        );
        assert!(matches!(result, Err(LifecycleError::File { .. })));
        assert!(!path.exists());
    }
}
