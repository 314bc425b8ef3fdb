//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// Accept connections and chat with one client at a time
    Server {
        /// Name stamped on messages typed on this console
        #[arg(default_value = "Server")]
        name: String,
        /// Port to listen on
        port: Option<u16>,
    },
    /// Connect to a server, reconnecting forever
    Client {
        /// Name stamped on messages typed on this console
        name: String,
        /// Host name or IP address of the server
        server_address: String,
        /// Server port
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let cli = Cli::try_parse_from(["simplechat", "server"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Server {
                name: "Server".to_string(),
                port: None
            }
        );
        assert!(!cli.verbose);
    }

    #[test]
    fn test_server_with_name_and_port() {
        let cli = Cli::try_parse_from(["simplechat", "server", "Matt", "4000"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Server {
                name: "Matt".to_string(),
                port: Some(4000)
            }
        );
    }

    #[test]
    fn test_client_arguments() {
        let cli =
            Cli::try_parse_from(["simplechat", "-v", "client", "Tom", "localhost"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::Client {
                name: "Tom".to_string(),
                server_address: "localhost".to_string(),
                port: None
            }
        );
    }

    #[test]
    fn test_client_requires_server_address() {
        assert!(Cli::try_parse_from(["simplechat", "client", "Tom"]).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["simplechat", "server", "Matt", "not-a-port"]).is_err());
        assert!(Cli::try_parse_from(["simplechat", "server", "Matt", "70000"]).is_err());
    }

    #[test]
    fn test_missing_mode_rejected() {
        assert!(Cli::try_parse_from(["simplechat"]).is_err());
        assert!(Cli::try_parse_from(["simplechat", "relay"]).is_err());
    }
}
