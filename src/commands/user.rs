//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;
use backoffice_core::types::id::{RoleId, UserId};
use backoffice_entity::user::{CreateUserInput, UpdateUserInput, UserWithRoles};
use backoffice_service::{AdminUserService, RequestContext};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Search users by name or email
    List {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
    },
    /// Show a user with its roles
    Show {
        /// User ID
        id: UserId,
    },
    /// Create a user; the password is prompted
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Role names, comma separated
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,
    },
    /// Edit a user; omitted fields keep their value
    Update {
        /// User ID
        id: UserId,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New email address
        #[arg(long)]
        email: Option<String>,
        /// Replace the role set, comma separated
        #[arg(long, value_delimiter = ',', conflicts_with = "no_roles")]
        roles: Option<Vec<String>>,
        /// Remove every role
        #[arg(long)]
        no_roles: bool,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },
    /// Delete a user
    Delete {
        /// User ID
        id: UserId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    roles: String,
    created_at: String,
}

impl From<&UserWithRoles> for UserRow {
    fn from(u: &UserWithRoles) -> Self {
        Self {
            id: u.user.id.to_string(),
            name: u.user.name.clone(),
            email: u.user.email.clone(),
            roles: u.role_names.join(", "),
            created_at: super::timestamp(&u.user.created_at),
        }
    }
}

async fn resolve_roles(
    service: &AdminUserService,
    ctx: &RequestContext,
    names: &[String],
) -> Result<Vec<RoleId>, AppError> {
    let options = service.role_options(ctx).await?;
    names
        .iter()
        .map(|name| {
            options
                .iter()
                .find(|r| r.name == *name)
                .map(|r| r.id)
                .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
        })
        .collect()
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    app: &App,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.actor(actor).await?;
    let service = app.users();

    match &args.command {
        UserCommand::List { search, page } => {
            let result = service.list(&ctx, search.clone(), *page).await?;
            let rows: Vec<UserRow> = result.items.iter().map(UserRow::from).collect();
            output::print_page(&result, &rows, format);
        }
        UserCommand::Show { id } => {
            let user = service.get(&ctx, *id).await?;
            output::print_item(&user, format);
        }
        UserCommand::Create { name, email, roles } => {
            let password = super::prompt_password("Password")?;
            let input = CreateUserInput {
                name: name.clone(),
                email: email.clone(),
                password_confirmation: password.clone(),
                password,
                role_ids: resolve_roles(&service, &ctx, roles).await?,
            };
            let outcome = service.create(&ctx, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        UserCommand::Update {
            id,
            name,
            email,
            roles,
            no_roles,
            password,
        } => {
            let current = service.get(&ctx, *id).await?;
            let role_ids = match (roles, no_roles) {
                (_, true) => Vec::new(),
                (Some(names), false) => resolve_roles(&service, &ctx, names).await?,
                (None, false) => current.role_ids.clone(),
            };
            let password = if *password {
                Some(super::prompt_password("New password")?)
            } else {
                None
            };
            let input = UpdateUserInput {
                name: name.clone().unwrap_or(current.user.name),
                email: email.clone().unwrap_or(current.user.email),
                password_confirmation: password.clone(),
                password,
                role_ids,
            };
            let outcome = service.update(&ctx, *id, input).await?;
            output::report_outcome(&outcome, format)?;
        }
        UserCommand::Delete { id, yes } => {
            let user = service.get(&ctx, *id).await?;
            if !super::confirm(&format!("Delete user '{}'?", user.user.email), *yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let outcome = service.delete(&ctx, *id).await?;
            output::report_outcome(&outcome, format)?;
        }
    }

    Ok(())
}
