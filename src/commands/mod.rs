//! CLI command definitions and dispatch.

pub mod activity;
pub mod audit;
pub mod meta;
pub mod migrate;
pub mod overview;
pub mod permission;
pub mod role;
pub mod seed;
pub mod user;

use clap::{Parser, Subcommand};

use backoffice_core::config::AppConfig;
use backoffice_core::error::AppError;

use crate::app::App;
use crate::output::OutputFormat;

/// Backoffice: users, roles, permissions and page meta tags
#[derive(Debug, Parser)]
#[command(name = "backoffice", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Email of the administrator performing the command
    #[arg(short, long, global = true)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Seed core permissions, roles, demo accounts and the home meta tag
    Seed(seed::SeedArgs),
    /// Dashboard totals and top lists
    Overview,
    /// User management
    User(user::UserArgs),
    /// Role management
    Role(role::RoleArgs),
    /// Permission management
    Permission(permission::PermissionArgs),
    /// Page meta tag management
    Meta(meta::MetaArgs),
    /// Login/logout activity
    Activity(activity::ActivityArgs),
    /// Audit trail
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let app = App::connect(config).await?;
        let actor = self.actor.as_deref();

        let result = match &self.command {
            Commands::Migrate => migrate::execute(&app).await,
            Commands::Seed(args) => seed::execute(args, &app, self.format).await,
            Commands::Overview => overview::execute(&app, actor, self.format).await,
            Commands::User(args) => user::execute(args, &app, actor, self.format).await,
            Commands::Role(args) => role::execute(args, &app, actor, self.format).await,
            Commands::Permission(args) => {
                permission::execute(args, &app, actor, self.format).await
            }
            Commands::Meta(args) => meta::execute(args, &app, actor, self.format).await,
            Commands::Activity(args) => activity::execute(args, &app, actor, self.format).await,
            Commands::Audit(args) => audit::execute(args, &app, actor, self.format).await,
        };

        app.close().await;
        result
    }
}

/// Ask before a destructive command unless `--yes` was given.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, AppError> {
    if assume_yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Prompt for a new password twice.
pub fn prompt_password(prompt: &str) -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Format a timestamp for table output.
pub fn timestamp(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
