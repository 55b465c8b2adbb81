use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "tws",
    about = "Trace warning package sync",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "tws.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download missing packages from the distribution server
    Sync(SyncArgs),
    /// Show cached packages and last run status
    Status(StatusArgs),
    /// Manage check-in windows
    Checkin(CheckinArgs),
}

#[derive(Args)]
pub struct SyncArgs {
    /// Regions to sync; defaults to the configured regions
    #[arg(short, long = "region")]
    pub regions: Vec<String>,
    /// Run even if the current hour is already downloaded
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    #[arg(short, long = "region")]
    pub regions: Vec<String>,
}

#[derive(Args)]
pub struct CheckinArgs {
    #[command(subcommand)]
    pub action: CheckinAction,
}

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record a check-in window (RFC 3339 timestamps)
    Add {
        #[arg(long)]
        start: DateTime<Utc>,
        /// Defaults to now
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },
    /// List recorded check-in windows
    List,
    /// Remove a check-in window by id
    Remove { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sync() {
        let cli =
            Cli::try_parse_from(["tws", "sync", "-r", "de", "--region", "nl", "--force"]).unwrap();
        if let Command::Sync(args) = cli.command {
            assert_eq!(args.regions, vec!["de".to_string(), "nl".to_string()]);
            assert!(args.force);
        } else { panic!("wrong command"); }
        assert_eq!(cli.config, PathBuf::from("tws.toml"));
    }

    #[test]
    fn parse_global_flags() {
        let cli =
            Cli::try_parse_from(["tws", "status", "--config", "/etc/tws.toml", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("/etc/tws.toml"));
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn parse_checkin_add() {
        let cli = Cli::try_parse_from([
            "tws", "checkin", "add",
            "--start", "2021-03-22T13:00:00Z",
            "--end", "2021-03-22T14:30:00Z",
        ]).unwrap();
        let Command::Checkin(CheckinArgs { action }) = cli.command else { panic!("wrong command") };
        if let CheckinAction::Add { start, end } = action {
            assert_eq!(start.to_rfc3339(), "2021-03-22T13:00:00+00:00");
            assert!(end.is_some());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_checkin_remove() {
        let id = Uuid::now_v7();
        let cli = Cli::try_parse_from(["tws", "checkin", "remove", &id.to_string()]).unwrap();
        let Command::Checkin(CheckinArgs { action }) = cli.command else { panic!("wrong command") };
        if let CheckinAction::Remove { id: parsed } = action {
            assert_eq!(parsed, id);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert!(Cli::try_parse_from(["tws", "checkin", "add", "--start", "yesterday"]).is_err());
    }
}
