//! Outbound SIP trunk administration tasks behind the `trunk-admin` binary

use crate::config::{ConfigError, TrunkDefaults};
use crate::domain::shared::error::{DomainError, Result as DomainResult};
use crate::domain::sip_trunk::{OutboundTrunk, OutboundTrunkInfo, SipTrunkRepository};
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const BANNER: &str = "LiveKit SIP Outbound Trunk Manager";

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTask {
    CreateTrunk,
    ListTrunks,
    DeleteTrunk,
}

impl AdminTask {
    pub fn parse(task: &str) -> Option<Self> {
        match task {
            "create_trunk" => Some(AdminTask::CreateTrunk),
            "list_trunks" => Some(AdminTask::ListTrunks),
            "delete_trunk" => Some(AdminTask::DeleteTrunk),
            _ => None,
        }
    }

    /// Task named by the first command-line argument, if it is a known one
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        args.first().and_then(|task| Self::parse(task.as_ref()))
    }
}

pub fn usage() -> String {
    [
        "Usage: trunk-admin <task>",
        "Available Tasks:",
        "    - create_trunk",
        "    - list_trunks",
        "    - delete_trunk",
    ]
    .join("\n")
}

/// Run `trunk-admin` with its command-line arguments.
///
/// `connect` is only called once a known task was named, so printing the
/// usage needs neither configuration nor the network.
pub async fn run_cli<S, F>(
    args: &[S],
    connect: F,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<(), AdminError>
where
    S: AsRef<str>,
    F: FnOnce() -> Result<(Box<dyn SipTrunkRepository>, TrunkDefaults), AdminError>,
{
    writeln!(out, "{}", BANNER)?;
    let Some(task) = AdminTask::from_args(args) else {
        writeln!(out, "{}", usage())?;
        return Ok(());
    };

    let (repository, defaults) = connect()?;
    TrunkAdmin::new(repository.as_ref(), defaults)
        .run(task, prompter, out)
        .await
}

/// Source of operator input
pub trait Prompter {
    /// Show `label` and read one line, without its line ending
    fn prompt(&mut self, label: &str) -> io::Result<String>;

    /// Like [`Prompter::prompt`] but without echoing the input
    fn prompt_password(&mut self, label: &str) -> io::Result<String>;
}

/// Interactive terminal input
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(label.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn prompt_password(&mut self, label: &str) -> io::Result<String> {
        rpassword::prompt_password(label)
    }
}

fn or_default(answer: String, default: &str) -> String {
    if answer.trim().is_empty() {
        default.to_string()
    } else {
        answer.trim().to_string()
    }
}

pub struct TrunkAdmin<'a> {
    repository: &'a dyn SipTrunkRepository,
    defaults: TrunkDefaults,
}

impl<'a> TrunkAdmin<'a> {
    pub fn new(repository: &'a dyn SipTrunkRepository, defaults: TrunkDefaults) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    pub async fn run(
        &self,
        task: AdminTask,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<(), AdminError> {
        match task {
            AdminTask::CreateTrunk => {
                let trunk = self.create_trunk(prompter, out).await?;
                writeln!(out, "\nCreated:\n{}", trunk)?;
            }
            AdminTask::ListTrunks => {
                let trunks = self.repository.list_trunks().await?;
                writeln!(out, "\nTrunks:")?;
                if trunks.is_empty() {
                    writeln!(out, "(none)")?;
                }
                for trunk in trunks {
                    writeln!(out, "{}\n", trunk)?;
                }
            }
            AdminTask::DeleteTrunk => {
                let trunk_id = prompter.prompt("Enter Trunk ID: ")?;
                let deleted = self.delete_trunk(&trunk_id).await?;
                writeln!(out, "\nDeleted:\n{}", deleted)?;
            }
        }
        Ok(())
    }

    /// Prompt for the trunk details and submit them
    pub async fn create_trunk(
        &self,
        prompter: &mut dyn Prompter,
        out: &mut dyn Write,
    ) -> Result<OutboundTrunkInfo, AdminError> {
        let defaults = &self.defaults;
        writeln!(out, "\nEnter Details:")?;

        let name = or_default(
            prompter.prompt(&format!("    Trunk Name ({}): ", defaults.name))?,
            &defaults.name,
        );
        let address = or_default(
            prompter.prompt(&format!("    Trunk Address ({}): ", defaults.address))?,
            &defaults.address,
        );
        let numbers = or_default(
            prompter.prompt(&format!(
                "    Phone Numbers (comma-separated) ({}): ",
                defaults.numbers
            ))?,
            &defaults.numbers,
        );

        writeln!(out, "From Twilio:")?;
        let auth_username = or_default(
            prompter.prompt(&format!(
                "    Authentication Username ({}): ",
                defaults.auth_username
            ))?,
            &defaults.auth_username,
        );
        let password_label = if defaults.auth_password.is_empty() {
            "    Authentication Password: "
        } else {
            "    Authentication Password (will default to environment variable TWILIO_SIP_AUTH_PASSWORD): "
        };
        let password = prompter.prompt_password(password_label)?;
        let auth_password = if password.is_empty() {
            defaults.auth_password.clone()
        } else {
            password
        };

        let trunk = OutboundTrunk::new(name, address)
            .with_numbers(&numbers)
            .with_credentials(auth_username, auth_password);
        trunk.validate()?;

        Ok(self.repository.create_trunk(trunk).await?)
    }

    pub async fn delete_trunk(&self, trunk_id: &str) -> DomainResult<OutboundTrunkInfo> {
        let trunk_id = trunk_id.trim();
        if trunk_id.is_empty() {
            return Err(DomainError::ValidationError(
                "trunk id cannot be empty".to_string(),
            ));
        }
        self.repository.delete_trunk(trunk_id).await
    }
}
