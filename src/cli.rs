use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the MCP server on stdin/stdout
    #[command(alias = "s")]
    Server(ServerArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn server_uses_default_config_path() {
        let cli = TestCli::try_parse_from(["mcp", "server"]).expect("parse");
        let Command::Server(args) = cli.command;
        assert_eq!(args.config, PathBuf::from("config.yml"));
    }

    #[test]
    fn alias_and_short_flag() {
        let cli = TestCli::try_parse_from(["mcp", "s", "-c", "/etc/mcp/wolfram.yml"]).expect("parse");
        let Command::Server(args) = cli.command;
        assert_eq!(args.config, PathBuf::from("/etc/mcp/wolfram.yml"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(TestCli::try_parse_from(["mcp"]).is_err());
    }
}
