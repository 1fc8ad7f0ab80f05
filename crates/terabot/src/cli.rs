use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "terabot")]
#[command(author, version, about = "Telegram bot that fetches Terabox share links and sends the videos back", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Resolve a share link and print the direct video URL
    Resolve {
        /// Share link, e.g. https://terabox.com/s/1abc
        url: String,
    },

    /// Download a share link into a local directory, without Telegram
    Fetch {
        /// Share link, e.g. https://terabox.com/s/1abc
        url: String,

        /// Directory to save the file into (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["terabot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_fetch_with_output() {
        let cli = Cli::try_parse_from(["terabot", "fetch", "https://terabox.com/s/1abc", "-o", "/tmp/out"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Fetch {
                url: "https://terabox.com/s/1abc".to_string(),
                output: Some(PathBuf::from("/tmp/out")),
            })
        );
    }
}
