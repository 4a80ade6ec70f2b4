//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

/// dsweb - deepstream chat simulator and REST harness
#[derive(Parser, Debug)]
#[command(name = "dsweb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.dsweb/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the REST backend
    #[arg(long, global = true)]
    pub rest_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Value of the `user` header on REST calls
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Value of the `token` header on REST calls
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            rest_url: cli.rest_url.clone(),
            debug: cli.debug,
            rest_user: cli.user.clone(),
            rest_token: cli.token.clone(),
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join a chat as a participant, reading messages from stdin
    Chat {
        /// Location of the chat page; its name selects the intervention
        #[arg(long, default_value = "index.html")]
        page: String,

        /// Display name (prompted for when missing)
        #[arg(short, long)]
        nickname: Option<String>,

        /// Register locally instead of against the REST backend
        #[arg(long)]
        offline: bool,

        /// Answer every message with a system echo
        #[arg(long)]
        echo: bool,

        /// Write the timeline as HTML to this file on exit
        #[arg(long)]
        transcript: Option<PathBuf>,
    },

    /// Call the REST backend
    Rest {
        #[command(subcommand)]
        command: RestCommands,
    },
}

/// REST command groups
#[derive(Subcommand, Debug)]
pub enum RestCommands {
    /// Variable access
    Variable {
        #[command(subcommand)]
        command: VariableCommands,
    },

    /// Votings
    Voting {
        #[command(subcommand)]
        command: VotingCommands,
    },

    /// Credits
    Credits {
        #[command(subcommand)]
        command: CreditsCommands,
    },

    /// Images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Register a participant for deepstream access
    Register {
        /// Nickname to register
        nickname: String,

        /// Intervention pattern (defaults to the configured routing key)
        #[arg(long)]
        pattern: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum VariableCommands {
    /// Read a variable
    Read { name: String },
    /// Read several variables
    ReadMany {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Write a variable
    Write { name: String, value: String },
    /// Read a variable across the participant's group
    ReadGroupArray { name: String },
    /// Read several variables across the participant's group
    ReadGroupArrayMany {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Read a variable across the intervention
    ReadInterventionArray { name: String },
    /// Read several variables across the intervention
    ReadInterventionArrayMany {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Average of a variable across the participant's group
    CalculateGroupAverage { name: String },
    /// Average of a variable across the intervention
    CalculateInterventionAverage { name: String },
}

#[derive(Subcommand, Debug)]
pub enum VotingCommands {
    /// Votings for a variable
    Votings { name: String },
    /// Votings for a variable across the participant's group
    VotingsGroupArray { name: String },
    /// Votings for a variable across the intervention
    VotingsInterventionArray { name: String },
    /// Vote for a receiving participant
    Vote { voting: String, receiver: String },
    /// Withdraw a vote
    Unvote { voting: String, receiver: String },
}

#[derive(Subcommand, Debug)]
pub enum CreditsCommands {
    /// Store a credit
    Store {
        /// Credit type
        kind: String,
        /// Credit id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// Upload an image into a variable
    Upload { variable: String, file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "dsweb",
            "rest",
            "variable",
            "read",
            "score",
            "--token",
            "t",
            "--rest-url",
            "http://h/api",
        ]);
        let overrides = Overrides::from(&cli);
        assert_eq!(overrides.rest_token.as_deref(), Some("t"));
        assert_eq!(overrides.rest_url.as_deref(), Some("http://h/api"));
        assert!(!overrides.debug);
    }

    #[test]
    fn test_chat_defaults() {
        let cli = Cli::parse_from(["dsweb", "chat", "--offline"]);
        let Commands::Chat {
            page,
            nickname,
            offline,
            echo,
            transcript,
        } = cli.command
        else {
            panic!("expected chat");
        };
        assert_eq!(page, "index.html");
        assert!(nickname.is_none());
        assert!(offline);
        assert!(!echo);
        assert!(transcript.is_none());
    }

    #[test]
    fn test_read_many_needs_names() {
        assert!(Cli::try_parse_from(["dsweb", "rest", "variable", "read-many"]).is_err());
        let cli = Cli::try_parse_from(["dsweb", "rest", "variable", "read-many", "a", "b"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rest {
                command: RestCommands::Variable {
                    command: VariableCommands::ReadMany { ref names }
                }
            } if names.len() == 2
        ));
    }
}
