//! Mail handoff: renders the localized commission email and hands it to the
//! system mail client through a `mailto:` URI. Building the message is pure;
//! launching the client is fire-and-forget with no delivery signal.

use crate::MailError;
use crate::language::Language;
use tokio::process::Command;

const DRAFT_SEPARATOR: &str = "----------------------------";

/// A commission request about to become an email. Constructed and consumed
/// immediately; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailIntent {
    pub category: String,
    pub recurring: bool,
    pub draft: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Percent-encoded `mailto:` URI for the given destination address.
    pub fn mailto_uri(&self, address: &str) -> String {
        format!(
            "mailto:{address}?subject={}&body={}",
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

/// Render the localized subject and body for a mail intent.
///
/// Deterministic for a fixed `(language, intent)`. An unrecognized category
/// falls back to the generic bespoke subject line rather than failing.
pub fn build_mail_message(language: Language, intent: &MailIntent) -> MailMessage {
    let locale = language.code();

    let subject_key = format!("mail.subjects.{}", intent.category);
    let mut subject = t!(&subject_key, locale = locale).into_owned();
    if subject == subject_key {
        subject = t!("mail.subjects.bespoke", locale = locale).into_owned();
    }
    if intent.recurring {
        subject = format!("{}{subject}", t!("mail.recurring_prefix", locale = locale));
    }

    let mut body = format!("{}\n\n", t!("mail.intro", locale = locale));

    if intent.recurring {
        body.push_str(&format!("{}\n\n", t!("mail.recurring_msg", locale = locale)));
    }

    if let Some(draft) = intent.draft.as_deref().filter(|d| !d.is_empty()) {
        body.push_str(&format!(
            "{}\n{DRAFT_SEPARATOR}\n{draft}\n{DRAFT_SEPARATOR}\n\n",
            t!("mail.draft_label", locale = locale)
        ));
    }

    body.push_str(&t!("mail.footer", locale = locale));

    MailMessage { subject, body }
}

/// Hand the URI to the platform opener. Success means the opener was spawned;
/// there is no signal from the mail client itself.
pub fn open_mail_client(uri: &str) -> crate::Result<()> {
    launch(opener_command(uri))
}

fn launch(mut command: Command) -> crate::Result<()> {
    command
        .spawn()
        .map_err(|err| MailError::Opener(err.to_string()))?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn opener_command(uri: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(uri);
    command
}

#[cfg(target_os = "windows")]
fn opener_command(uri: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", uri]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(uri: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(uri);
    command
}
