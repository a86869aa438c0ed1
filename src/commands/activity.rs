//! User activity CLI commands.

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand, ValueEnum};

use backoffice_core::error::AppError;
use backoffice_core::events::AuthEvent;
use backoffice_core::types::id::UserId;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for activity commands
#[derive(Debug, Args)]
pub struct ActivityArgs {
    /// Activity subcommand
    #[command(subcommand)]
    pub command: ActivityCommand,
}

/// Which auth event to record
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EventKind {
    Login,
    Logout,
}

/// Activity subcommands
#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    /// Record a login or logout reported by the identity provider
    Record {
        /// Event kind
        #[arg(value_enum)]
        kind: EventKind,
        /// User ID
        user: UserId,
        /// Client IP address
        #[arg(long)]
        ip: Option<String>,
        /// Client user agent
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Delete activity rows
    Purge {
        /// Only rows older than this many days
        #[arg(long, conflicts_with = "all")]
        older_than_days: Option<i64>,
        /// Every row
        #[arg(long)]
        all: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// The instant `days` days before `now`.
fn purge_cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, AppError> {
    if days < 0 {
        return Err(AppError::validation(
            "--older-than-days must not be negative; use --all to delete everything",
        ));
    }
    Duration::try_days(days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| AppError::validation(format!("--older-than-days {days} is out of range")))
}

/// Execute activity commands
pub async fn execute(
    args: &ActivityArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ActivityCommand::Record {
            kind,
            user,
            ip,
            user_agent,
        } => {
            let event = match kind {
                EventKind::Login => AuthEvent::Login {
                    user_id: *user,
                    ip_address: ip.clone(),
                    user_agent: user_agent.clone(),
                    at: Utc::now(),
                },
                EventKind::Logout => AuthEvent::Logout {
                    user_id: *user,
                    ip_address: ip.clone(),
                    user_agent: user_agent.clone(),
                    at: Utc::now(),
                },
            };
            let recorder = app.activity_recorder();
            recorder.record(event).await?;
            let recorded = recorder.shutdown().await?;
            if recorded == 0 {
                return Err(AppError::internal("Activity could not be recorded"));
            }
            output::print_success("Activity recorded.");
        }
        ActivityCommand::Purge {
            older_than_days,
            all,
            yes,
        } => {
            let before = match (older_than_days, all) {
                (Some(days), false) => Some(purge_cutoff(Utc::now(), *days)?),
                (None, true) => None,
                _ => return Err(AppError::validation("Pass --older-than-days <N> or --all")),
            };
            let ctx = app.actor(actor).await?;
            let prompt = match before {
                Some(cutoff) => format!(
                    "Delete activity recorded before {}?",
                    super::timestamp(&cutoff)
                ),
                None => "Delete ALL recorded activity?".to_string(),
            };
            if !super::confirm(&prompt, *yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let recorder = app.activity_recorder();
            let purged = recorder.purge(&ctx, before).await;
            recorder.shutdown().await?;
            let purged = purged?;

            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Purged {purged} activity rows."));
                }
                OutputFormat::Json => {
                    output::print_item(&serde_json::json!({ "purged": purged }), format);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::error::ErrorKind;

    #[test]
    fn test_cutoff_is_days_before_now() {
        let now = Utc::now();
        assert_eq!(purge_cutoff(now, 30).unwrap(), now - Duration::days(30));
        assert_eq!(purge_cutoff(now, 0).unwrap(), now);
    }

    #[test]
    fn test_negative_days_rejected() {
        let err = purge_cutoff(Utc::now(), -1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_out_of_range_days_rejected() {
        for days in [i64::MAX, 10_000_000_000] {
            let err = purge_cutoff(Utc::now(), days).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }
}
