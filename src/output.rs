//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::types::notification::{Notification, NotificationKind};
use backoffice_core::types::pagination::PageResponse;
use backoffice_service::{ActionOutcome, FieldErrors};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{json}");
}

/// Print a list of rows in the selected format
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => print_json(rows),
    }
}

/// Print one page of a listing: the table plus a page footer, or the
/// whole page envelope as JSON.
pub fn print_page<T, R>(page: &PageResponse<T>, rows: &[R], format: OutputFormat)
where
    T: Serialize,
    R: Serialize + Tabled,
{
    match format {
        OutputFormat::Table => {
            print_list(rows, format);
            println!(
                "Page {} of {} ({} total)",
                page.page, page.total_pages, page.total_items
            );
        }
        OutputFormat::Json => print_json(page),
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => match serde_json::to_value(item) {
            Ok(serde_json::Value::Object(map)) => {
                for (key, value) in map {
                    print_kv(&key, &display_value(&value));
                }
            }
            Ok(serde_json::Value::Null) => {}
            _ => print_json(item),
        },
        OutputFormat::Json => print_json(item),
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

/// Print a notification with the marker for its kind
pub fn print_notification(notification: &Notification) {
    match notification.kind {
        NotificationKind::Success | NotificationKind::Info => print_success(&notification.message),
        NotificationKind::Warning => print_warning(&notification.message),
        NotificationKind::Danger => print_error(&notification.message),
    }
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, messages) in errors.iter() {
        for message in messages {
            print_error(&format!("{field}: {message}"));
        }
    }
}

/// Render an action outcome. Anything but success becomes an error so
/// the process exits non-zero; its message has already been printed.
pub fn report_outcome<T: Serialize>(
    outcome: &ActionOutcome<T>,
    format: OutputFormat,
) -> Result<(), AppError> {
    if format == OutputFormat::Json {
        print_json(outcome);
    }

    match outcome {
        ActionOutcome::Success {
            value,
            notification,
        } => {
            if format == OutputFormat::Table {
                print_notification(notification);
                print_item(value, format);
            }
            Ok(())
        }
        ActionOutcome::Invalid { errors } => {
            if format == OutputFormat::Table {
                print_field_errors(errors);
            }
            Err(AppError::validation("The given data was invalid."))
        }
        ActionOutcome::Rejected { notification, .. } => {
            Err(AppError::new(ErrorKind::Conflict, notification.message.clone()))
        }
        ActionOutcome::Failed { notification } => {
            Err(AppError::new(ErrorKind::Internal, notification.message.clone()))
        }
    }
}
