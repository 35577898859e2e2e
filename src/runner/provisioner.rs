//! Per-record provisioning operations.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::debug;

use super::ccache::CredentialCache;
use super::output::{ClassifyPolicy, CommandSpec, TaskOutcome, run_command};
use crate::config::{ExecutionContext, Mode, ToolSettings};
use crate::records::Record;

/// Runs the provisioning operation of a run for one record.
pub trait Provisioner: Send + Sync + 'static {
    fn provision(&self, record: &Record) -> impl Future<Output = TaskOutcome> + Send;
}

/// Provisions records through the `ipa` and `kinit` command-line tools.
#[derive(Debug, Clone)]
pub struct DirectoryProvisioner {
    context: Arc<ExecutionContext>,
    settings: ToolSettings,
    policy: ClassifyPolicy,
}

impl DirectoryProvisioner {
    #[must_use]
    pub fn new(context: Arc<ExecutionContext>, settings: ToolSettings) -> Self {
        Self {
            context,
            settings,
            policy: ClassifyPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ClassifyPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn user_add(&self, name: &str) -> CommandSpec {
        CommandSpec::new(
            &self.settings.ipa_program,
            [
                "user-add".to_owned(),
                name.to_owned(),
                format!("--first={name}"),
                format!("--last={name}"),
            ],
        )
    }

    fn host_add(&self, name: &str, domain: &str) -> CommandSpec {
        CommandSpec::new(
            &self.settings.ipa_program,
            ["host-add".to_owned(), format!("{name}.{domain}"), "--force".to_owned()],
        )
    }

    fn dns_record_add(&self, name: &str, domain: &str, ip: Ipv4Addr) -> CommandSpec {
        CommandSpec::new(
            &self.settings.ipa_program,
            [
                "dnsrecord-add".to_owned(),
                domain.to_owned(),
                name.to_owned(),
                format!("--a-rec={ip}"),
            ],
        )
    }

    fn group_add(&self, name: &str) -> CommandSpec {
        CommandSpec::new(&self.settings.ipa_program, ["group-add", name])
    }

    fn password_reset(&self, name: &str) -> CommandSpec {
        CommandSpec::new(
            &self.settings.ipa_program,
            ["passwd", name, self.settings.placeholder_password.as_str()],
        )
    }

    fn kinit(&self, name: &str, cache: &CredentialCache, input: String) -> CommandSpec {
        CommandSpec::new(
            &self.settings.kinit_program,
            ["-c".to_owned(), cache.arg(), name.to_owned()],
        )
        .with_stdin(input)
    }

    /// Runs one command and classifies its output.
    async fn step(&self, name: &str, label: &str, spec: CommandSpec) -> TaskOutcome {
        debug!("[{}] {}: {}", name, label, spec);
        let outcome = match run_command(&spec).await {
            Ok(output) => self.policy.classify(name, &output),
            Err(e) => TaskOutcome::Crashed {
                name: name.to_owned(),
                detail: format!("could not run {}: {e}", spec.program.display()),
            },
        };
        outcome.in_step(label)
    }

    async fn create_host(&self, record: &Record) -> TaskOutcome {
        let name = record.name.as_str();
        let (Some(domain), Some(ip)) = (self.context.domain.as_deref(), record.ip) else {
            return TaskOutcome::Crashed {
                name: name.to_owned(),
                detail: "host record is missing its domain or address".to_owned(),
            };
        };

        let host = self.step(name, "host-add", self.host_add(name, domain)).await;
        let dns = self
            .step(name, "dnsrecord-add", self.dns_record_add(name, domain, ip))
            .await;
        host.worse(dns)
    }

    async fn activate_user(&self, name: &str, password: &str) -> TaskOutcome {
        let reset = self.step(name, "passwd", self.password_reset(name)).await;

        let cache = CredentialCache::for_record(&self.settings.ccache_dir, name);
        let placeholder = &self.settings.placeholder_password;
        let input = format!("{placeholder}\n{password}\n{password}\n");
        let change = self.step(name, "kinit", self.kinit(name, &cache, input)).await;

        reset.worse(change)
    }

    async fn authenticate_user(&self, name: &str, password: &str) -> TaskOutcome {
        let cache = CredentialCache::for_record(&self.settings.ccache_dir, name);
        self.step(name, "kinit", self.kinit(name, &cache, format!("{password}\n")))
            .await
    }
}

impl Provisioner for DirectoryProvisioner {
    async fn provision(&self, record: &Record) -> TaskOutcome {
        let name = record.name.as_str();
        let password = self.context.password.as_ref().map(|p| p.expose());

        match (self.context.mode, password) {
            (Mode::UserCreate, _) => self.step(name, "user-add", self.user_add(name)).await,
            (Mode::HostCreate, _) => self.create_host(record).await,
            (Mode::GroupCreate, _) => self.step(name, "group-add", self.group_add(name)).await,
            (Mode::UserActivate, Some(password)) => self.activate_user(name, password).await,
            (Mode::UserAuthenticate, Some(password)) => {
                self.authenticate_user(name, password).await
            }
            (Mode::UserActivate | Mode::UserAuthenticate, None) => TaskOutcome::Crashed {
                name: name.to_owned(),
                detail: "no password configured".to_owned(),
            },
        }
    }
}
