//! `elka open <path>`: run the page behind a route path.

use elka_core::{Hub, Route};

use crate::cli::{DeviceListArgs, DevicesArgs, DevicesCommand, GlobalOpts, SortColumn};
use crate::error::CliError;
use crate::output;

use super::{auth, devices, logs};

fn default_list() -> DeviceListArgs {
    DeviceListArgs {
        mine: false,
        page: 1,
        rows: elka_core::listing::DEFAULT_ROWS_PER_PAGE,
        sort: SortColumn::Name,
        asc: false,
        name: None,
        user_id: None,
    }
}

/// Navigation lines for the home page.
fn home(hub: &Hub) -> String {
    let header = hub.header();
    let mut lines = Vec::new();
    if let Some(ref name) = header.display_name {
        lines.push(format!("Signed in as {name}"));
        lines.push(String::new());
    }
    for (label, route) in header.nav() {
        lines.push(format!("  {label:<12} elka open {route}"));
    }
    lines.join("\n")
}

pub async fn handle(hub: &Hub, path: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let route = Route::parse(path);
    if route.requires_auth() && !hub.session().is_logged_in() {
        output::warning(
            global,
            &format!("{} requires sign-in; redirecting to {}", route.title(), Route::Login),
        );
        return Err(CliError::AuthRequired);
    }
    tracing::debug!(%route, "opening page");

    let devices_cmd = |command| devices::handle(hub, DevicesArgs { command }, global);

    match route {
        Route::Home => {
            output::print_output(&home(hub), global.quiet);
            Ok(())
        }
        Route::Login => {
            output::print_output("Sign in with: elka auth login", global.quiet);
            Ok(())
        }
        Route::Register => {
            output::print_output("Create an account with: elka auth register", global.quiet);
            Ok(())
        }
        Route::Profile => {
            let profile = auth::current_profile(hub).await?;
            let out = output::render_single(&global.output, &profile, auth::profile_detail, |p| {
                p.email.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
        Route::Devices => devices_cmd(DevicesCommand::List(default_list())).await,
        Route::DeviceCreate => {
            devices_cmd(DevicesCommand::Create {
                name: None,
                serial: None,
                room: None,
            })
            .await
        }
        Route::DeviceDetail(device) => devices_cmd(DevicesCommand::Get { device }).await,
        Route::DeviceLogs(device) => devices_cmd(DevicesCommand::Logs { device }).await,
        Route::Logs => logs::handle_logs(hub, global).await,
        Route::YandexCallback => {
            // The query string carries the code; Route::parse drops it.
            let outcome = hub.auth().complete_yandex(path).await?;
            output::success(
                global,
                &format!("Signed in with Yandex as {}", outcome.profile.email),
            );
            Ok(())
        }
        Route::NotFound(path) => Err(CliError::NotFound {
            resource_type: "page".into(),
            identifier: path,
            list_command: "open /".into(),
        }),
    }
}
