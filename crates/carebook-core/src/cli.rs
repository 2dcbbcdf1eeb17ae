use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use carebook_shared::AppointmentStatus;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "carebook",
    version,
    about = "Carebook: book, schedule and cancel patient appointments",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "carebookrc", global = true)]
    pub carebookrc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Request a new appointment (create form).
    Book(BookArgs),
    /// Confirm or move an existing appointment.
    Schedule(ScheduleArgs),
    /// Cancel an existing appointment.
    Cancel(CancelArgs),
    /// List appointments, soonest first.
    List(ListArgs),
    /// Show one appointment in full.
    Info(IdArg),
    /// Print the doctor catalogue.
    Physicians,
    /// Show queued patient notifications.
    Notifications(NotificationsArgs),
    /// Print the effective configuration.
    Show,
}

#[derive(Args, Debug, Clone)]
pub struct BookArgs {
    /// Account booking the appointment. Falls back to `session.user`.
    #[arg(long)]
    pub user: Option<String>,
    /// Patient record. Falls back to `session.patient`.
    #[arg(long)]
    pub patient: Option<String>,
    #[arg(long)]
    pub physician: String,
    /// Date and time, e.g. `2026-03-05 14:30`, `tomorrow 3pm`.
    #[arg(long)]
    pub at: String,
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Appointment id or a unique prefix of it.
    pub id: String,
    /// Defaults to the account that booked the appointment.
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub physician: Option<String>,
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CancelArgs {
    pub id: String,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub reason: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub patient: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Args, Debug, Clone)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct NotificationsArgs {
    #[arg(long)]
    pub appointment: Option<String>,
}

fn parse_status(raw: &str) -> Result<AppointmentStatus, String> {
    raw.parse::<AppointmentStatus>()
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Command, GlobalCli};

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_cancel_with_globals_after_subcommand() {
        let cli = GlobalCli::try_parse_from(args(&[
            "carebook",
            "cancel",
            "1a2b",
            "--reason",
            "feeling better",
            "-vv",
        ]))
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Cancel(cancel)) => {
                assert_eq!(cancel.id, "1a2b");
                assert_eq!(cancel.reason, "feeling better");
                assert!(cancel.user.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn repeated_rc_flags_collect_in_order() {
        let cli = GlobalCli::try_parse_from(args(&[
            "carebook",
            "--rc",
            "notify=off",
            "list",
            "--rc",
            "session.user = user-2",
        ]))
        .expect("parse");

        let pairs: Vec<_> = cli
            .rc_overrides
            .iter()
            .map(|kv| (kv.key.as_str(), kv.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("notify", "off"), ("session.user", "user-2")]);
        assert!(GlobalCli::try_parse_from(args(&["carebook", "--rc", "notify"])).is_err());
    }

    #[test]
    fn list_status_accepts_american_spelling() {
        let cli = GlobalCli::try_parse_from(args(&["carebook", "list", "--status", "canceled"]))
            .expect("parse");
        match cli.command {
            Some(Command::List(list)) => {
                assert_eq!(
                    list.status,
                    Some(carebook_shared::AppointmentStatus::Cancelled)
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
