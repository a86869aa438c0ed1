//! Database migration command.

use backoffice_core::error::AppError;

use crate::app::App;
use crate::output;

/// Apply every pending migration.
pub async fn execute(app: &App) -> Result<(), AppError> {
    println!("Running database migrations...");
    backoffice_database::migration::run_migrations(app.pool()).await?;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
