use std::path::PathBuf;

use carta_types::SnapshotKind;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "carta",
    about = "CARTA object registry: create objects, run commands, serve over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file (server settings plus a [manager] table)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List registered object classes
    Classes(ClassesArgs),
    /// Execute a command script against a fresh registry
    Run(RunArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ClassesArgs {}

#[derive(Args)]
pub struct RunArgs {
    /// Script file; reads standard input when omitted
    pub script: Option<PathBuf>,
    /// Write a snapshot of the registry here after the script finishes
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Snapshot category to write
    #[arg(long, default_value = "preferences")]
    pub kind: SnapshotKind,
    /// Keep executing after a command fails
    #[arg(short, long)]
    pub keep_going: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address; overrides the configuration file
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub cors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classes() {
        let cli = Cli::try_parse_from(["carta", "classes"]).unwrap();
        assert!(matches!(cli.command, Command::Classes(_)));
        assert!(!cli.verbose);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::try_parse_from(["carta", "run"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert!(args.script.is_none());
            assert!(args.snapshot.is_none());
            assert_eq!(args.kind, SnapshotKind::Preferences);
            assert!(!args.keep_going);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_run_with_snapshot() {
        let cli = Cli::try_parse_from([
            "carta", "run", "session.txt", "--snapshot", "out.json", "--kind", "Layout", "-k",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.script, Some(PathBuf::from("session.txt")));
            assert_eq!(args.snapshot, Some(PathBuf::from("out.json")));
            assert_eq!(args.kind, SnapshotKind::Layout);
            assert!(args.keep_going);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_bad_snapshot_kind() {
        assert!(Cli::try_parse_from(["carta", "run", "--kind", "everything"]).is_err());
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["carta", "serve", "--bind", "0.0.0.0:8080", "--cors"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:8080".into()));
            assert!(args.cors);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from(["carta", "classes", "-v", "--config", "carta.toml", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("carta.toml")));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_unknown_command() {
        assert!(Cli::try_parse_from(["carta", "frobnicate"]).is_err());
    }
}
