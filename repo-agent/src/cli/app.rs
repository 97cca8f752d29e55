use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-agent",
    version,
    about = "Repo Agent - Record, attribute and check every change to a source tree",
    long_about = "Repo Agent watches a source tree, keeps a per-day activity log of every file change with diffs, guesses whether an AI tool or a person made each change, and checks files against the rules in .agent/rules.yaml."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Root of the watched tree
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize repo-agent in the current directory
    #[command(about = "Create .agent/ with default config, ignore, rules, standards and purpose files")]
    Init,

    /// Watch the tree in the foreground
    #[command(about = "Start watching the tree until interrupted")]
    Start,

    /// Stop the running agent
    #[command(about = "Stop the running agent")]
    Stop,

    /// Show whether the agent is running
    #[command(about = "Show whether the agent is running or paused")]
    Status,

    /// Pause event recording
    #[command(about = "Pause event recording in the running agent")]
    Pause,

    /// Resume event recording
    #[command(about = "Resume event recording in the running agent")]
    Resume,

    /// Check the tree against the compliance rules
    #[command(about = "Check every tracked file against .agent/rules.yaml")]
    Check(CheckArgs),

    /// Show activity logs
    #[command(about = "Show the activity log of a day or a date range")]
    Logs(LogsArgs),

    /// Index the codebase
    #[command(about = "Index functions, classes and imports into .agent/scan.json")]
    Scan,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Day to show (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["from", "to"])]
    pub date: Option<NaiveDate>,

    /// First day of a range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day of a range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    repo_agent_core::activity::reader::parse_date(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_range_args() {
        let cli = Cli::try_parse_from(["repo-agent", "logs", "--from", "2026-01-01", "--to", "2026-01-31"]).unwrap();
        let Commands::Logs(args) = cli.command else {
            panic!("expected logs");
        };
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(args.to, NaiveDate::from_ymd_opt(2026, 1, 31));
        assert!(args.date.is_none());
    }

    #[test]
    fn test_date_conflicts_with_range() {
        assert!(Cli::try_parse_from(["repo-agent", "logs", "--date", "2026-01-01", "--from", "2026-01-01"]).is_err());
        assert!(Cli::try_parse_from(["repo-agent", "logs", "--date", "yesterday"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["repo-agent", "check", "--json", "-vv", "--root", "/srv/app"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, PathBuf::from("/srv/app"));
        assert!(matches!(cli.command, Commands::Check(CheckArgs { json: true })));
    }
}
