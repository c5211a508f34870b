//! Process wiring shared by both server binaries
//!
//! Loads configuration, installs logging, builds the variant's provider,
//! registers its tool, and serves MCP over stdio until the client hangs up.

use std::{io, sync::Arc};

use thiserror::Error;
use tracing::{error, info};

use crate::{
    cli::ServerArgs,
    config::{Config, ConfigError},
    domain::{
        greeting::GreetingService,
        tools::{GreetingHello, WolframQuery},
        wolfram::WolframService,
    },
    logging::{init_logging, LoggingError},
    mcp::{
        registry::RegistryError,
        server::{McpServer, ServerInfo},
        transport::LineTransport,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Greeting,
    WolframAlpha,
}

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Self::Greeting => "mcp-greeting",
            Self::WolframAlpha => "mcp-wolfram-alpha",
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Self::Greeting => "Use greeting/hello to produce a greeting, optionally addressed to a name.",
            Self::WolframAlpha => {
                "Use wolfram_query for exact calculations, unit conversions and factual data lookups."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),
}

/// `<crate version>`, suffixed with ` (<revision>)` when the build supplied
/// `MCP_BUILD_REVISION`.
pub fn version_string() -> String {
    format_version(env!("CARGO_PKG_VERSION"), option_env!("MCP_BUILD_REVISION"))
}

fn format_version(version: &str, revision: Option<&str>) -> String {
    match revision.map(str::trim).filter(|revision| !revision.is_empty()) {
        Some(revision) => format!("{version} ({revision})"),
        None => version.to_string(),
    }
}

pub fn build_server(variant: Variant, config: &Config) -> Result<McpServer, StartupError> {
    let mut server = McpServer::new(ServerInfo {
        name: variant.name().to_string(),
        version: version_string(),
        instructions: Some(variant.instructions().to_string()),
    });

    match variant {
        Variant::Greeting => {
            let greeter = Arc::new(GreetingService::new(&config.greeting));
            server.register_tool(Arc::new(GreetingHello::new(greeter)))?;
        }
        Variant::WolframAlpha => {
            let service = Arc::new(WolframService::from_config(&config.wolfram)?);
            server.register_tool(Arc::new(WolframQuery::new(service)))?;
        }
    }

    Ok(server)
}

pub async fn run(variant: Variant, args: &ServerArgs) -> Result<(), StartupError> {
    let config = Config::load(&args.config)?;
    let _log_guard = init_logging(config.debug, &config.log)?;

    info!(
        server = variant.name(),
        version = %version_string(),
        config = %args.config.display(),
        "starting mcp server"
    );

    let server = build_server(variant, &config).inspect_err(|err| {
        error!(error = %err, "failed to build mcp server");
    })?;

    let mut transport = LineTransport::stdio();
    server.serve(&mut transport).await.inspect_err(|err| {
        error!(error = %err, "mcp transport failed");
    })?;

    info!(server = variant.name(), "mcp server stopped");
    Ok(())
}
