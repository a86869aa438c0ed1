//! Permission management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;
use backoffice_core::types::id::PermissionId;
use backoffice_entity::permission::{Permission, PermissionInput};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for permission commands
#[derive(Debug, Args)]
pub struct PermissionArgs {
    /// Permission subcommand
    #[command(subcommand)]
    pub command: PermissionCommand,
}

/// Permission subcommands
#[derive(Debug, Subcommand)]
pub enum PermissionCommand {
    /// Search permissions by name
    List {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
    },
    /// Show a permission
    Show {
        /// Permission ID
        id: PermissionId,
    },
    /// Create a permission
    Create {
        /// Permission name
        #[arg(long)]
        name: String,
    },
    /// Rename a permission
    Update {
        /// Permission ID
        id: PermissionId,
        /// New name
        #[arg(long)]
        name: String,
    },
    /// Delete a permission
    Delete {
        /// Permission ID
        id: PermissionId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    id: String,
    name: String,
    created_at: String,
}

impl From<&Permission> for PermissionRow {
    fn from(p: &Permission) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            created_at: super::timestamp(&p.created_at),
        }
    }
}

/// Execute permission commands
pub async fn execute(
    args: &PermissionArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.actor(actor).await?;
    let service = app.permissions();

    match &args.command {
        PermissionCommand::List { search, page } => {
            let result = service.list(&ctx, search.clone(), *page).await?;
            let rows: Vec<PermissionRow> = result.items.iter().map(PermissionRow::from).collect();
            output::print_page(&result, &rows, format);
        }
        PermissionCommand::Show { id } => {
            let permission = service.get(&ctx, *id).await?;
            output::print_item(&permission, format);
        }
        PermissionCommand::Create { name } => {
            let outcome = service
                .create(&ctx, PermissionInput { name: name.clone() })
                .await?;
            output::report_outcome(&outcome, format)?;
        }
        PermissionCommand::Update { id, name } => {
            let outcome = service
                .update(&ctx, *id, PermissionInput { name: name.clone() })
                .await?;
            output::report_outcome(&outcome, format)?;
        }
        PermissionCommand::Delete { id, yes } => {
            let permission = service.get(&ctx, *id).await?;
            if !super::confirm(&format!("Delete permission '{}'?", permission.name), *yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let outcome = service.delete(&ctx, *id).await?;
            output::report_outcome(&outcome, format)?;
        }
    }

    Ok(())
}
