//! Role management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;
use backoffice_core::types::id::{PermissionId, RoleId};
use backoffice_entity::role::{RoleInput, RoleWithPermissions};
use backoffice_service::{RequestContext, RoleService};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    /// Role subcommand
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// Search roles by name
    List {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
    },
    /// Show a role with its permissions
    Show {
        /// Role ID
        id: RoleId,
    },
    /// Create a role
    Create {
        /// Role name
        #[arg(long)]
        name: String,
        /// Permission names, comma separated
        #[arg(long, value_delimiter = ',')]
        permissions: Vec<String>,
    },
    /// Edit a role; omitted fields keep their value
    Update {
        /// Role ID
        id: RoleId,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Replace the permission set, comma separated
        #[arg(long, value_delimiter = ',', conflicts_with = "no_permissions")]
        permissions: Option<Vec<String>>,
        /// Remove every permission
        #[arg(long)]
        no_permissions: bool,
    },
    /// Delete a role
    Delete {
        /// Role ID
        id: RoleId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    id: String,
    name: String,
    permissions: String,
    created_at: String,
}

impl From<&RoleWithPermissions> for RoleRow {
    fn from(r: &RoleWithPermissions) -> Self {
        Self {
            id: r.role.id.to_string(),
            name: r.role.name.clone(),
            permissions: r.permission_names.join(", "),
            created_at: super::timestamp(&r.role.created_at),
        }
    }
}

async fn resolve_permissions(
    service: &RoleService,
    ctx: &RequestContext,
    names: &[String],
) -> Result<Vec<PermissionId>, AppError> {
    let options = service.permission_options(ctx).await?;
    names
        .iter()
        .map(|name| {
            options
                .iter()
                .find(|p| p.name == *name)
                .map(|p| p.id)
                .ok_or_else(|| AppError::not_found(format!("Permission '{name}' not found")))
        })
        .collect()
}

/// Execute role commands
pub async fn execute(
    args: &RoleArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.actor(actor).await?;
    let service = app.roles();

    match &args.command {
        RoleCommand::List { search, page } => {
            let result = service.list(&ctx, search.clone(), *page).await?;
            let rows: Vec<RoleRow> = result.items.iter().map(RoleRow::from).collect();
            output::print_page(&result, &rows, format);
        }
        RoleCommand::Show { id } => {
            let role = service.get(&ctx, *id).await?;
            output::print_item(&role, format);
        }
        RoleCommand::Create { name, permissions } => {
            let input = RoleInput {
                name: name.clone(),
                permission_ids: resolve_permissions(&service, &ctx, permissions).await?,
            };
            let outcome = service.create(&ctx, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        RoleCommand::Update {
            id,
            name,
            permissions,
            no_permissions,
        } => {
            let current = service.get(&ctx, *id).await?;
            let permission_ids = match (permissions, no_permissions) {
                (_, true) => Vec::new(),
                (Some(names), false) => resolve_permissions(&service, &ctx, names).await?,
                (None, false) => current.permission_ids,
            };
            let input = RoleInput {
                name: name.clone().unwrap_or(current.role.name),
                permission_ids,
            };
            let outcome = service.update(&ctx, *id, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        RoleCommand::Delete { id, yes } => {
            let role = service.get(&ctx, *id).await?;
            if !super::confirm(&format!("Delete role '{}'?", role.role.name), *yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let outcome = service.delete(&ctx, *id).await?;
            output::report_outcome(&outcome, format)?;
        }
    }

    Ok(())
}
