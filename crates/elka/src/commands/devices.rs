//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use elka_core::listing::{ROWS_PER_PAGE_OPTIONS, rows_from};
use elka_core::pages::{SYNC_FAILED, synced_count};
use elka_core::models::{
    Device, DeviceCommand, DeviceEvent, DeviceList, DeviceQuery, DeviceSortField, DeviceUpdate,
    SortDirection,
};
use elka_core::{CreateDeviceForm, DeviceTable, Hub, MqttForm, TableQuery, TableSource};

use crate::cli::{DeviceListArgs, DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat, SortColumn};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceTableRow {
    #[tabled(rename = "#")]
    number: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Serial Number")]
    serial: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

#[derive(Tabled)]
struct CommandRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Command Type")]
    command_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created At")]
    created_at: String,
    #[tabled(rename = "Completed At")]
    completed_at: String,
}

impl From<&DeviceCommand> for CommandRow {
    fn from(c: &DeviceCommand) -> Self {
        Self {
            id: c.id,
            command_type: c.command_type.clone(),
            status: c.status.clone(),
            created_at: output::timestamp(c.created_at.as_ref()),
            completed_at: output::timestamp(c.completed_at.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Event Type")]
    event_type: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Created At")]
    created_at: String,
}

impl From<&DeviceEvent> for EventRow {
    fn from(e: &DeviceEvent) -> Self {
        Self {
            id: e.id,
            event_type: e.event_type.clone(),
            message: e.message.clone(),
            created_at: output::timestamp(e.created_at.as_ref()),
        }
    }
}

#[derive(Serialize)]
struct LogsPayload<'a> {
    device: &'a str,
    commands: &'a [DeviceCommand],
    events: &'a [DeviceEvent],
}

pub(crate) fn detail(d: &Device) -> String {
    let opt = |v: Option<&String>| v.map_or_else(|| "-".to_owned(), Clone::clone);
    let mut lines = vec![
        format!("ID:         {}", d.id),
        format!("Name:       {}", d.name),
        format!("Serial:     {}", d.serial_number),
        format!("Owner:      {}", d.owner_label()),
        format!("Room:       {}", opt(d.room.as_ref())),
        format!("Type:       {}", opt(d.device_type.as_ref())),
        format!("Status:     {}", opt(d.status.as_ref())),
        format!("Last seen:  {}", output::timestamp(d.last_seen.as_ref())),
    ];
    match d.mqtt_settings {
        Some(ref mqtt) if !mqtt.broker_address.is_empty() => {
            lines.push(format!("MQTT:       {}", mqtt.broker_address));
            if !mqtt.username.is_empty() {
                lines.push(format!("MQTT user:  {}", mqtt.username));
            }
        }
        _ => lines.push("MQTT:       not configured".into()),
    }
    lines.join("\n")
}

// ── Listing ─────────────────────────────────────────────────────────

fn sort_field(col: SortColumn) -> DeviceSortField {
    match col {
        SortColumn::Id => DeviceSortField::Id,
        SortColumn::Name => DeviceSortField::Name,
        SortColumn::SerialNumber => DeviceSortField::SerialNumber,
        SortColumn::Status => DeviceSortField::Status,
        SortColumn::LastSeen => DeviceSortField::LastSeen,
        SortColumn::UserId => DeviceSortField::UserId,
        SortColumn::CreatedAt => DeviceSortField::CreatedAt,
        SortColumn::UpdatedAt => DeviceSortField::UpdatedAt,
    }
}

/// Validate list flags into the table's fetch key.
pub(crate) fn table_query(args: &DeviceListArgs) -> Result<TableQuery, CliError> {
    if !ROWS_PER_PAGE_OPTIONS.contains(&args.rows) {
        return Err(CliError::Validation {
            field: "rows".into(),
            reason: format!("expected one of 10, 20, 50, got {}", args.rows),
        });
    }
    if args.page == 0 {
        return Err(CliError::Validation {
            field: "page".into(),
            reason: "pages start at 1".into(),
        });
    }
    Ok(TableQuery {
        page: args.page - 1,
        rows_per_page: args.rows,
        sort_field: sort_field(args.sort),
        sort_direction: if args.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
    })
}

fn print_table(table: &DeviceTable, global: &GlobalOpts) {
    if table.rows().is_empty() {
        output::print_output("No devices found.", global.quiet);
        return;
    }
    let rows: Vec<DeviceTableRow> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, r)| DeviceTableRow {
            number: table.row_number(i),
            name: r.name.clone(),
            serial: r.serial_number.clone(),
            owner: r.owner.clone(),
        })
        .collect();
    output::print_output(&output::render_table(&rows), global.quiet);
    if !global.quiet {
        eprintln!(
            "Rows on the page: {}   {}",
            table.query().rows_per_page,
            table.range_label()
        );
    }
}

fn show_list<T: Serialize>(
    list: &DeviceList<T>,
    table: &mut DeviceTable,
    global: &GlobalOpts,
    id_fn: impl Fn(&T) -> String,
) where
    for<'a> elka_core::DeviceRow: From<&'a T>,
{
    if let OutputFormat::Table = global.output {
        let ticket = table.begin_fetch();
        table.finish_fetch(ticket, Ok(rows_from(list)));
        print_table(table, global);
    } else {
        let out = output::render_single(&global.output, list, |_| String::new(), |l| {
            l.devices.iter().map(&id_fn).collect::<Vec<_>>().join("\n")
        });
        output::print_output(&out, global.quiet);
    }
}

async fn list(hub: &Hub, args: DeviceListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let query = table_query(&args)?;
    if args.mine {
        let mut table = DeviceTable::with_query(TableSource::Mine, query);
        let devices = hub.my_devices(query.pagination()).await?;
        show_list(&devices, &mut table, global, |d| d.id.clone());
    } else {
        let mut table = DeviceTable::with_query(TableSource::All, query);
        let mut params = query.to_params();
        params.name = args.name;
        params.user_id = args.user_id;
        let devices = hub.list_devices(&params).await?;
        show_list(&devices, &mut table, global, |d| d.serial_number.clone());
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(hub: &Hub, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list_args) => list(hub, list_args, global).await,

        DevicesCommand::Get { device } => {
            let found = hub
                .device(&device)
                .await
                .map_err(|e| CliError::or_not_found(e, "device", &device))?;
            let out = output::render_single(&global.output, &found, detail, |d| {
                d.serial_number.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Create { name, serial, room } => {
            let mut form = CreateDeviceForm::default();
            form.name = util::value_or_prompt(name, "Device Name")?;
            form.serial_number = util::value_or_prompt(serial, "Serial Number")?;
            form.room = util::value_or_prompt_default(room, "Room", &form.room)?;

            let Some(body) = form.begin_submit() else {
                return Err(CliError::Validation {
                    field: "device".into(),
                    reason: form.error().unwrap_or("invalid input").to_owned(),
                });
            };
            let device = match hub.create_device(&body).await {
                Ok(device) => device,
                Err(e) if e.to_string().trim().is_empty() => {
                    return Err(CliError::Api {
                        message: "Failed to create device".into(),
                        status: e.status(),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            let out = output::render_single(&global.output, &device, detail, |d| {
                d.serial_number.clone()
            });
            output::print_output(&out, global.quiet);
            if let Some(next) = form.finish_submit(Ok(device)) {
                output::success(global, &format!("Device created. See: elka open {next}"));
            }
            Ok(())
        }

        DevicesCommand::Update {
            device,
            name,
            serial,
            room,
            status,
        } => {
            let update = DeviceUpdate {
                name,
                serial_number: serial,
                status,
                room,
                mqtt_settings: None,
            };
            if update == DeviceUpdate::default() {
                return Err(CliError::Validation {
                    field: "device".into(),
                    reason: "nothing to update".into(),
                });
            }
            let updated = hub
                .update_device(&device, &update)
                .await
                .map_err(|e| CliError::or_not_found(e, "device", &device))?;
            let out = output::render_single(&global.output, &updated, detail, |d| {
                d.serial_number.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Delete { device } => {
            if !util::confirm(&format!("Delete device {device}?"), global.yes, "delete")? {
                return Ok(());
            }
            hub.delete_device(&device)
                .await
                .map_err(|e| CliError::or_not_found(e, "device", &device))?;
            output::success(global, &format!("Device {device} deleted."));
            Ok(())
        }

        DevicesCommand::Mqtt {
            device,
            broker,
            username,
            password_env,
        } => {
            let current = hub
                .device(&device)
                .await
                .map_err(|e| CliError::or_not_found(e, "device", &device))?;
            if broker.is_none() && username.is_none() && password_env.is_none() {
                let settings = current.mqtt_settings.clone().unwrap_or_default();
                let out = output::render_single(
                    &global.output,
                    &settings,
                    |s| {
                        format!(
                            "Broker:   {}\nUsername: {}\nPassword: {}",
                            if s.broker_address.is_empty() { "-" } else { &s.broker_address },
                            if s.username.is_empty() { "-" } else { &s.username },
                            if s.password.is_empty() { "-" } else { "****" },
                        )
                    },
                    |s| s.broker_address.clone(),
                );
                output::print_output(&out, global.quiet);
                return Ok(());
            }

            let mut form = MqttForm::from(current.mqtt_settings.as_ref());
            if let Some(b) = broker {
                form.broker_address = b;
            }
            if let Some(u) = username {
                form.username = u;
            }
            if password_env.is_some() {
                form.password = util::secret("Broker password", password_env.as_deref())?;
            }
            hub.update_mqtt(&device, form.to_settings()).await?;
            output::success(global, "MQTT settings saved.");
            Ok(())
        }

        DevicesCommand::Sync => {
            let pb = output::spinner(global, "Syncing devices from Yandex...");
            let result = hub.sync_yandex_devices().await;
            pb.finish_and_clear();

            let payload = result.map_err(|e| {
                if e.to_string().trim().is_empty() {
                    CliError::Api {
                        message: SYNC_FAILED.into(),
                        status: e.status(),
                    }
                } else {
                    e.into()
                }
            })?;
            let count = synced_count(&payload);
            if matches!(global.output, OutputFormat::Table) {
                output::success(global, &format!("Successfully synced {count} device(s)."));
            } else {
                let out = output::render_single(&global.output, &payload, |_| String::new(), |_| {
                    count.to_string()
                });
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        DevicesCommand::Query { name, user_id } => {
            let found = hub.query_devices(&DeviceQuery { name, user_id }).await?;
            let mut table = DeviceTable::new(TableSource::Mine);
            show_list(&found, &mut table, global, |d| d.serial_number.clone());
            Ok(())
        }

        DevicesCommand::Logs { device } => {
            let logs = hub
                .device_logs(&device)
                .await
                .map_err(|e| CliError::or_not_found(e, "device", &device))?;
            match global.output {
                OutputFormat::Table => {
                    if global.quiet {
                        return Ok(());
                    }
                    let commands: Vec<CommandRow> = logs.commands.iter().map(Into::into).collect();
                    let events: Vec<EventRow> = logs.events.iter().map(Into::into).collect();
                    println!("Device Logs for ID: {device}\n");
                    println!("Commands");
                    println!("{}\n", output::render_table(&commands));
                    println!("Events");
                    println!("{}", output::render_table(&events));
                }
                _ => {
                    let payload = LogsPayload {
                        device: &device,
                        commands: &logs.commands,
                        events: &logs.events,
                    };
                    let out = output::render_single(&global.output, &payload, |_| String::new(), |p| {
                        p.events
                            .iter()
                            .map(|e| e.message.clone())
                            .collect::<Vec<_>>()
                            .join("\n")
                    });
                    output::print_output(&out, global.quiet);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn list_args(argv: &[&str]) -> DeviceListArgs {
        let mut full = vec!["elka", "devices", "list"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Devices(DevicesArgs {
                command: DevicesCommand::List(args),
            }) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn default_list_matches_table_defaults() {
        let query = table_query(&list_args(&[])).unwrap();
        assert_eq!(query, TableQuery::default());
    }

    #[test]
    fn list_flags_map_to_query() {
        let query =
            table_query(&list_args(&["--page", "3", "--rows", "50", "--sort", "last-seen", "--asc"]))
                .unwrap();
        assert_eq!(query.skip(), 100);
        assert_eq!(query.sort_field, DeviceSortField::LastSeen);
        assert_eq!(query.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn unsupported_page_size_is_rejected() {
        let err = table_query(&list_args(&["--rows", "25"])).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "rows"));
        assert!(table_query(&list_args(&["--page", "0"])).is_err());
    }
}
