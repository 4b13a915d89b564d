//! Invocations of the broker's administrative CLIs.

use crate::config::ServiceConfig;
use crate::executor::Invocation;

const RABBITMQCTL: &str = "rabbitmqctl";
const RABBITMQ_PLUGINS: &str = "rabbitmq-plugins";

/// Permission pattern granting configure, write and read on everything.
const FULL_PERMISSIONS: &str = ".*";

/// Default virtual host.
const DEFAULT_VHOST: &str = "/";

/// Enable a broker plugin.
pub fn enable_plugin(plugin: &str) -> Invocation {
    Invocation::new(RABBITMQ_PLUGINS).args(["enable", plugin])
}

/// Delete a broker account. Best-effort: the account may already be gone.
pub fn delete_account(account: &str) -> Invocation {
    Invocation::new(RABBITMQCTL)
        .args(["delete_user", account])
        .ignore_failures()
}

/// The calls that create or refresh the administrator account.
///
/// Every call is best-effort and independent of the others, so a repeated
/// start converges: `add_user` fails once the account exists, and the later
/// calls still bring its password, tags and permissions up to date.
pub fn provision_admin(config: &ServiceConfig) -> Vec<Invocation> {
    let user = config.admin_username.as_str();
    let password = config.admin_password.as_str();

    vec![
        Invocation::new(RABBITMQCTL)
            .args(["add_user", user, password])
            .sensitive()
            .ignore_failures(),
        Invocation::new(RABBITMQCTL)
            .args(["change_password", user, password])
            .sensitive()
            .ignore_failures(),
        Invocation::new(RABBITMQCTL)
            .args(["set_user_tags", user, "administrator"])
            .ignore_failures(),
        Invocation::new(RABBITMQCTL)
            .args(["set_permissions", "-p", DEFAULT_VHOST, user])
            .args([FULL_PERMISSIONS, FULL_PERMISSIONS, FULL_PERMISSIONS])
            .ignore_failures(),
    ]
}
