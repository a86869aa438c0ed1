//! Dashboard overview command.

use serde::Serialize;
use tabled::Tabled;

use backoffice_core::error::AppError;

use crate::app::App;
use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct LatestUserRow {
    name: String,
    email: String,
    created_at: String,
}

#[derive(Debug, Serialize, Tabled)]
struct UsageRow {
    name: String,
    count: i64,
}

/// Print totals, latest users and the top roles and permissions
pub async fn execute(app: &App, actor: Option<&str>, format: OutputFormat) -> Result<(), AppError> {
    let ctx = app.actor(actor).await?;
    let overview = app.overview().overview(&ctx).await?;

    if format == OutputFormat::Json {
        output::print_item(&overview, format);
        return Ok(());
    }

    output::print_kv("Users", &overview.total_users.to_string());
    output::print_kv("Roles", &overview.total_roles.to_string());
    output::print_kv("Permissions", &overview.total_permissions.to_string());

    println!("\nLatest users");
    let latest: Vec<LatestUserRow> = overview
        .latest_users
        .iter()
        .map(|u| LatestUserRow {
            name: u.name.clone(),
            email: u.email.clone(),
            created_at: super::timestamp(&u.created_at),
        })
        .collect();
    output::print_list(&latest, format);

    println!("\nTop roles (users)");
    let roles: Vec<UsageRow> = overview
        .top_roles
        .iter()
        .map(|r| UsageRow {
            name: r.name.clone(),
            count: r.users_count,
        })
        .collect();
    output::print_list(&roles, format);

    println!("\nTop permissions (roles)");
    let permissions: Vec<UsageRow> = overview
        .top_permissions
        .iter()
        .map(|p| UsageRow {
            name: p.name.clone(),
            count: p.roles_count,
        })
        .collect();
    output::print_list(&permissions, format);

    Ok(())
}
