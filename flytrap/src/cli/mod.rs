//! CLI module for flytrap
//!
//! Provides the command-line interface for the capture server.

pub mod serve;

use clap::{Parser, Subcommand};

/// Flytrap - capture HTTP requests sent to any path
#[derive(Parser, Debug)]
#[command(name = "flytrap")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    FLYTRAP_HOST                  Bind address (default: 0.0.0.0)
    FLYTRAP_CAPTURE_PORT          Capture listener port (default: 9000)
    FLYTRAP_QUERY_PORT            Query listener port (default: 9001)
    FLYTRAP_TTL                   Forget paths idle for this long (default: 30m)
    FLYTRAP_TICK                  Prune sweep interval (default: 1m)
    FLYTRAP_ECHO                  Echo captured requests back to the sender
    FLYTRAP_MAX_RECORDS_PER_PATH  Keep only the newest N requests per path
    FLYTRAP_LOG_LEVEL             Log level (default: info)
    HANDLER_TTL                   Deprecated alias of FLYTRAP_TTL
"#)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the implicit `serve` command
    #[command(flatten)]
    pub serve: serve::ServeArgs,
}

impl Cli {
    /// The serve arguments, whichever form was used on the command line
    pub fn serve_args(self) -> serve::ServeArgs {
        match self.command {
            Some(Commands::Serve(args)) => args,
            None => self.serve,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the capture and query listeners
    Serve(serve::ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["flytrap", "-c", "8000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve_args().capture_port, 8000);
    }

    #[test]
    #[serial]
    fn test_explicit_serve_subcommand() {
        let cli = Cli::try_parse_from(["flytrap", "serve", "--query-port", "8001"]).unwrap();
        assert_eq!(cli.serve_args().query_port, 8001);
    }
}
