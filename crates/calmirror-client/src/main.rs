//! calmirror CLI entry point.

use std::process::ExitCode;

use calmirror_core::{Direction, TracingConfig, init_tracing};
use clap::Parser;

use calmirror_client::app::App;
use calmirror_client::cli::{AuthAction, CalendarsAction, Cli, Command, ConfigAction};
use calmirror_client::commands::{auth, calendars, config, events, prefs};
use calmirror_client::config::ClientConfig;
use calmirror_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    }
    .with_format(cli.log_format);
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() || config_path.exists() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::default()
    };

    // Config commands work without touching the data directory.
    if let Some(Command::Config { action }) = &cli.command {
        return match action {
            ConfigAction::Dump => config::dump(&config, &config_path),
            ConfigAction::Validate => config::validate(&config),
            ConfigAction::Path => config::path(&config, &config_path),
        };
    }

    let json = cli.json;
    let app = App::open(config, cli.date).await?;

    match cli.command {
        Some(Command::Auth { action }) => match action {
            AuthAction::Login {
                client_id,
                client_secret,
                credentials_file,
                force,
            } => {
                auth::login(
                    &app,
                    &config_path,
                    client_id,
                    client_secret,
                    credentials_file,
                    force,
                )
                .await
            }
            AuthAction::Logout => auth::logout(&app).await,
            AuthAction::Status => auth::status(&app, json).await,
        },
        Some(Command::Calendars { action, offline }) => match action {
            None | Some(CalendarsAction::List) => calendars::list(&app, offline, json).await,
            Some(CalendarsAction::Toggle { id }) => calendars::toggle(&app, &id).await,
        },
        Some(Command::Sync { full }) => events::sync(&app, full).await,
        Some(Command::Events { offline, ids }) => events::show(&app, offline, json, ids).await,
        Some(Command::View { view }) => prefs::view(&app, view, json).await,
        Some(Command::Next) => prefs::navigate(&app, Direction::Next, json).await,
        Some(Command::Prev) => prefs::navigate(&app, Direction::Prev, json).await,
        Some(Command::Today) => prefs::today(&app, json).await,
        Some(Command::Key { chord }) => prefs::key(&app, &chord, json).await,
        Some(Command::Theme { theme }) => prefs::theme(&app, theme).await,
        Some(Command::Create(args)) => events::create(&app, args).await,
        Some(Command::Update { id, event }) => events::update(&app, &id, event).await,
        Some(Command::Delete { id, calendar }) => events::delete(&app, &id, &calendar).await,
        Some(Command::Config { .. }) => Ok(()),
        None => events::show(&app, false, json, false).await,
    }
}
