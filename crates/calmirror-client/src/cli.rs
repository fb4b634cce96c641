//! Command-line interface definition.

use std::path::PathBuf;

use calmirror_core::{CalendarView, LogFormat, Theme};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

/// calmirror - Google Calendar from the terminal
#[derive(Debug, Parser)]
#[command(name = "calmirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "CALMIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log line format on stderr: compact or json
    #[arg(long, global = true, default_value = "compact", env = "CALMIRROR_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Date to work from instead of today (YYYY-MM-DD)
    #[arg(long, short, global = true)]
    pub date: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, sign out, show the session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List calendars or toggle their visibility
    Calendars {
        #[command(subcommand)]
        action: Option<CalendarsAction>,

        /// Use the locally stored list instead of fetching it
        #[arg(long)]
        offline: bool,
    },

    /// Sync events for the current view
    Sync {
        /// Ignore stored sync tokens and fetch everything
        #[arg(long)]
        full: bool,
    },

    /// Show the agenda of the current view (the default command)
    Events {
        /// Show stored events without syncing
        #[arg(long)]
        offline: bool,

        /// Show event ids
        #[arg(long)]
        ids: bool,
    },

    /// Show or change the view
    View {
        /// day, 3days, workweek, week, 2weeks or month
        view: Option<CalendarView>,
    },

    /// Show the next period of the current view
    Next,

    /// Show the previous period of the current view
    Prev,

    /// Show the period containing today
    Today,

    /// Apply a keyboard shortcut, e.g. `ctrl+m` or `arrowright`
    Key {
        chord: String,
    },

    /// Show or change the theme
    Theme {
        /// default, dark-blue, dark-green or dark-purple
        theme: Option<Theme>,
    },

    /// Create an event
    Create(EventArgs),

    /// Update an event
    Update {
        /// Event id, as shown by `events --ids`
        id: String,

        #[command(flatten)]
        event: EventArgs,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: String,

        /// Calendar owning the event
        #[arg(long, default_value = "primary")]
        calendar: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Authentication actions.
#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Sign in with Google
    Login {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to Google Cloud Console credentials JSON file
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Sign in again even if a session exists
        #[arg(long, short)]
        force: bool,
    },

    /// Sign out and forget synced data
    Logout,

    /// Show the session state
    Status,
}

/// Calendar actions.
#[derive(Debug, Subcommand)]
pub enum CalendarsAction {
    /// List calendars
    List,

    /// Show or hide a calendar's events
    Toggle {
        /// Calendar id
        id: String,
    },
}

/// Event form fields.
#[derive(Debug, Clone, Default, Args)]
pub struct EventArgs {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    /// Calendar id
    #[arg(long)]
    pub calendar: Option<String>,

    /// Start, as YYYY-MM-DDTHH:MM or YYYY-MM-DD
    #[arg(long, value_parser = parse_datetime)]
    pub start: Option<NaiveDateTime>,

    /// End, as YYYY-MM-DDTHH:MM or YYYY-MM-DD
    #[arg(long, value_parser = parse_datetime)]
    pub end: Option<NaiveDateTime>,

    /// Make an all-day event; only the dates of start and end are kept
    #[arg(long)]
    pub all_day: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration and data paths
    Path,
}

/// Parses a local date-time. Seconds are optional, a space may replace the
/// `T`, and a bare date means midnight.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .ok_or_else(|| format!("invalid date-time `{}`, expected YYYY-MM-DDTHH:MM", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-15T09:30").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-15 09:30:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-01-15").unwrap(),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(parse_datetime("15/01/2024").is_err());
    }

    #[test]
    fn parses_create_command() {
        let cli = Cli::try_parse_from([
            "calmirror",
            "--date",
            "2024-01-15",
            "create",
            "--title",
            "Standup",
            "--start",
            "2024-01-15T09:00",
            "--end",
            "2024-01-15T09:30",
        ])
        .unwrap();
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        let Some(Command::Create(args)) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.title.as_deref(), Some("Standup"));
        assert!(!args.all_day);
    }

    #[test]
    fn parses_view_names() {
        let cli = Cli::try_parse_from(["calmirror", "view", "3days"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::View {
                view: Some(CalendarView::ThreeDays)
            })
        ));
        assert!(Cli::try_parse_from(["calmirror", "view", "fortnight"]).is_err());
    }
}
