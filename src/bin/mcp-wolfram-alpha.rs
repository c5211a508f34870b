use std::process::ExitCode;

use clap::Parser;
use mcp_tool_servers::{
    app::{self, Variant},
    cli::Command,
};

#[derive(Debug, Parser)]
#[command(
    name = "mcp-wolfram-alpha",
    version = app::version_string(),
    about = "MCP server exposing Wolfram Alpha queries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let Command::Server(args) = cli.command;

    if let Err(err) = app::run(Variant::WolframAlpha, &args).await {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
