//! Global log view and the admin user list.

use tabled::Tabled;

use elka_core::Hub;
use elka_core::models::{LogEntry, Pagination, UserProfile};

use crate::cli::{GlobalOpts, PageArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&LogEntry> for LogRow {
    fn from(e: &LogEntry) -> Self {
        Self {
            timestamp: output::timestamp(e.timestamp.as_ref()),
            device: e.device_label(),
            message: e.message.clone(),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Yandex")]
    yandex: String,
}

impl From<&UserProfile> for UserRow {
    fn from(u: &UserProfile) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.name.clone(),
            role: if u.is_admin() {
                "Admin".into()
            } else {
                u.role_label().to_owned()
            },
            yandex: if u.has_yandex() { "yes" } else { "" }.into(),
        }
    }
}

pub async fn handle_logs(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    let entries = hub.logs().await?;
    if entries.is_empty() {
        output::print_output("No log entries found.", global.quiet);
        return Ok(());
    }
    let out = output::render_list(&global.output, &entries, |e| LogRow::from(e), |e| {
        e.message.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_users(hub: &Hub, args: PageArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let users = hub
        .admin_users(Pagination {
            skip: args.skip,
            limit: args.limit,
        })
        .await?;
    let out = output::render_list(&global.output, &users, |u| UserRow::from(u), |u| u.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
