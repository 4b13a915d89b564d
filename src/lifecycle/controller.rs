//! Lifecycle controller.
//!
//! Each operation is a fixed sequence of host calls. A checked call that
//! fails stops the sequence; nothing already applied is rolled back.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{ServiceConfig, Settings};
use crate::error::LifecycleResult;
use crate::executor::{CommandOutput, FailurePolicy, Invocation};
use crate::platform::Platform;
use crate::services::{RabbitmqService, ServiceDefinition};
use crate::templates::{TemplateEngine, CONFIG_TEMPLATE, ENV_TEMPLATE};

use super::broker;
use super::operation::Operation;
use super::status::classify_service_check;

/// Drives install, configure, start, stop and status for the broker.
pub struct LifecycleController<P: Platform> {
    platform: P,
    service: Box<dyn ServiceDefinition>,
    templates: TemplateEngine,
    packages: Vec<String>,
    repository_line: String,
    repository_list_file: PathBuf,
    env_file: PathBuf,
    config_file: PathBuf,
}

impl<P: Platform> LifecycleController<P> {
    /// Create a controller for the RabbitMQ service on `platform`.
    pub fn new(platform: P, settings: &Settings) -> LifecycleResult<Self> {
        let templates = match &settings.paths.templates_dir {
            Some(dir) => TemplateEngine::with_overrides(dir)?,
            None => TemplateEngine::builtin()?,
        };

        Ok(Self {
            platform,
            service: Box::new(RabbitmqService),
            templates,
            packages: settings.packages.names.clone(),
            repository_line: settings.repository.line.clone(),
            repository_list_file: settings.repository.list_file.clone(),
            env_file: settings.paths.env_file.clone(),
            config_file: settings.paths.config_file.clone(),
        })
    }

    /// The platform this controller drives.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Run the named operation.
    pub fn run(&self, operation: Operation, config: &ServiceConfig) -> LifecycleResult<()> {
        match operation {
            Operation::Install => self.install(config),
            Operation::Configure => self.configure(config),
            Operation::Start => self.start(config),
            Operation::Stop => self.stop(config),
            Operation::Status => self.status(config),
        }
    }

    /// Register the package source, create the system user, install the
    /// packages and plugins, then start the service.
    pub fn install(&self, config: &ServiceConfig) -> LifecycleResult<()> {
        info!(
            list_file = %self.repository_list_file.display(),
            "Registering package repository"
        );
        self.call(Invocation::shell(&format!(
            "echo \"{}\" | tee '{}'",
            self.repository_line,
            self.repository_list_file.display()
        )))?;
        self.call(apt_get().arg("update"))?;

        info!(user = %config.user, group = %config.group, "Creating system user");
        self.platform
            .ensure_user(&config.user, std::slice::from_ref(&config.group))?;

        info!(packages = ?self.packages, "Installing packages");
        self.call(apt_get().args(["install", "-y"]).args(&self.packages))?;

        for plugin in self.service.install_plugins() {
            info!(plugin = %plugin, "Enabling plugin");
            self.call(broker::enable_plugin(plugin))?;
        }

        self.start(config)
    }

    /// Write the environment file and the broker configuration file.
    pub fn configure(&self, config: &ServiceConfig) -> LifecycleResult<()> {
        info!(service = %self.service.display_name(), "Configuring");
        let context = self.service.template_context(config);

        for (template, path) in [
            (ENV_TEMPLATE, &self.env_file),
            (CONFIG_TEMPLATE, &self.config_file),
        ] {
            let content = self.templates.render(template, &context)?;
            info!(path = %path.display(), "Writing configuration file");
            self.platform
                .write_file(path, &content, &config.user, &config.group)?;
        }

        Ok(())
    }

    /// Configure, start the service, then reset the broker accounts.
    pub fn start(&self, config: &ServiceConfig) -> LifecycleResult<()> {
        self.configure(config)?;

        info!(service = %self.service.init_service(), "Starting service");
        self.call(self.service_command("start"))?;

        info!(account = %self.service.default_account(), "Removing default account");
        self.call(broker::delete_account(self.service.default_account()))?;

        info!(user = %config.admin_username, "Provisioning administrator account");
        for invocation in broker::provision_admin(config) {
            self.call(invocation)?;
        }

        Ok(())
    }

    /// Stop the service.
    pub fn stop(&self, _config: &ServiceConfig) -> LifecycleResult<()> {
        info!(service = %self.service.init_service(), "Stopping service");
        self.call(self.service_command("stop"))?;
        Ok(())
    }

    /// Check whether the service is running.
    ///
    /// `Ok(())` means running. [`crate::error::LifecycleError::NotRunning`]
    /// means definitively stopped; any other error means the state is unknown.
    pub fn status(&self, config: &ServiceConfig) -> LifecycleResult<()> {
        let invocation = self.service_command("status").as_user(&config.user);
        let label = self.service.display_name();
        let command = invocation.command_line();

        info!(command = %command, user = %config.user, label = %label, "Performing service check");
        let output = self.platform.execute(&invocation)?;
        classify_service_check(label, &command, output)
    }

    fn service_command(&self, action: &str) -> Invocation {
        Invocation::new("service").args([self.service.init_service(), action])
    }

    /// Execute an invocation and apply its failure policy.
    ///
    /// Under [`FailurePolicy::Ignore`] a command that cannot even be spawned
    /// is swallowed as well.
    fn call(&self, invocation: Invocation) -> LifecycleResult<CommandOutput> {
        match self.platform.execute(&invocation) {
            Ok(output) => invocation.check(output),
            Err(e) if invocation.policy == FailurePolicy::Ignore => {
                warn!(
                    command = %invocation.command_line(),
                    error = %e,
                    "Command could not run, ignoring"
                );
                Ok(CommandOutput::with_exit_code(-1))
            }
            Err(e) => Err(e),
        }
    }
}

fn apt_get() -> Invocation {
    Invocation::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}
