use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Routes live-stream chat into a word-guessing game.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: search for quizcast.toml or config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Configuration profile (e.g. "production")
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the chat router (default)
    Run {
        /// Streamer to attach to; saved as the default for next time
        #[arg(short = 'u', long = "username", value_name = "USER")]
        username: Option<String>,

        /// Connect to the configured or saved streamer at startup
        #[arg(long)]
        auto_start: bool,
    },
    /// Capture comment events and write a user-object report
    Capture {
        /// Streamer to attach to
        #[arg(short = 'u', long = "username", value_name = "USER")]
        username: String,

        /// Number of comments to capture
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Report path (default: capture_<user>_<timestamp>.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Run {
            username: None,
            auto_start: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from(["quizcast", "run", "-u", "@host", "--auto-start"]);
        let Some(Commands::Run {
            username,
            auto_start,
        }) = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(username.as_deref(), Some("@host"));
        assert!(auto_start);
    }

    #[test]
    fn test_parse_capture_with_global_flags() {
        let cli = Cli::parse_from([
            "quizcast",
            "capture",
            "-u",
            "host",
            "--count",
            "3",
            "--profile",
            "prod",
        ]);
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        let Some(Commands::Capture { count, output, .. }) = cli.command else {
            panic!("expected capture");
        };
        assert_eq!(count, 3);
        assert!(output.is_none());
    }

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["quizcast"]);
        assert!(cli.command.is_none());
        assert!(matches!(
            Commands::default(),
            Commands::Run {
                username: None,
                auto_start: false
            }
        ));
    }

    #[test]
    fn test_capture_requires_user() {
        assert!(Cli::try_parse_from(["quizcast", "capture"]).is_err());
    }
}
