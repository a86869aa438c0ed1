//! Seeding command.

use clap::Args;

use backoffice_core::error::AppError;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Password for the seeded accounts; prompted when omitted
    #[arg(long)]
    pub password: Option<String>,
}

/// Seed whatever is missing
pub async fn execute(args: &SeedArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => super::prompt_password("Password for the seeded accounts")?,
    };

    let report = app.seeder().run(&password).await?;

    if format == OutputFormat::Table {
        output::print_success("Seeding complete.");
    }
    output::print_item(&report, format);
    Ok(())
}
