//! Audit trail CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;
use backoffice_core::types::id::UserId;
use backoffice_core::types::pagination::PageRequest;
use backoffice_entity::audit::AuditQuery;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// List audit entries, newest first
    List {
        /// Filter by acting user ID
        #[arg(long)]
        by: Option<UserId>,
        /// Filter by target type (user, role, permission, meta_tag, system)
        #[arg(long)]
        target_type: Option<String>,
        /// Filter by action, e.g. "role.delete"
        #[arg(long)]
        action: Option<String>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
        /// Entries per page
        #[arg(long, default_value = "50")]
        per_page: u64,
    },
}

/// Audit display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    time: String,
    actor: String,
    action: String,
    outcome: String,
    target: String,
    details: String,
}

/// Execute audit commands
pub async fn execute(
    args: &AuditArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.actor(actor).await?;

    match &args.command {
        AuditCommand::List {
            by,
            target_type,
            action,
            page,
            per_page,
        } => {
            let query = AuditQuery {
                actor_id: *by,
                target_type: target_type.clone(),
                action: action.clone(),
                page: PageRequest::new(*page, *per_page),
            };
            let result = app.audit_trail().list(&ctx, &query).await?;

            let rows: Vec<AuditRow> = result
                .items
                .iter()
                .map(|e| AuditRow {
                    time: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    actor: e
                        .actor_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "system".to_string()),
                    action: e.action.clone(),
                    outcome: e.outcome.to_string(),
                    target: e.target_id.map(|id| id.to_string()).unwrap_or_default(),
                    details: e
                        .details
                        .as_ref()
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                })
                .collect();

            output::print_page(&result, &rows, format);
        }
    }

    Ok(())
}
