//! Tools exposed via Model Context Protocol
//!
//! `greeting/hello` delegates to a [`Greeter`], `wolfram_query` to a
//! [`QueryExecutor`]. Each tool's argument struct doubles as its input
//! schema (through `mcp_tool`) and as the typed target of argument decoding.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::arguments::{ArgumentReader, FromArguments};
use crate::domain::greeting::Greeter;
use crate::domain::wolfram::{QueryExecutor, QueryOptions};
use crate::errors::AppError;
use crate::mcp::registry::ToolHandler;
use crate::wolfram_client::Units;

#[macros::mcp_tool(name = "greeting/hello", description = "Generate a greeting message")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GreetingHelloTool {
    /// Optional name for a personalized greeting
    pub name: Option<String>,
}

impl FromArguments for GreetingHelloTool {
    fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, AppError> {
        let reader = ArgumentReader::new(arguments);
        let name = Some(reader.optional_string("name")).filter(|name| !name.is_empty());
        reader.finish(Self { name })
    }
}

#[macros::mcp_tool(
    name = "wolfram_query",
    description = "Run a Wolfram Alpha query to perform calculations or look up knowledge. \
Wolfram Alpha evaluates numerical and symbolic math precisely (arithmetic, algebraic equations, \
calculus) and answers factual questions about physical constants, chemical properties, \
statistics and geography. Prefer it over estimating such results yourself whenever a \
computation or exact data lookup is needed."
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct WolframQueryTool {
    /// The Wolfram Alpha query to execute
    pub query: String,
    /// Maximum characters in the response (default: 2000)
    pub max_chars: Option<i64>,
    /// Unit system to use: metric or nonmetric
    pub units: Option<Units>,
    /// Country code for localization (e.g. 'JP')
    pub country_code: Option<String>,
    /// Language code for localization (e.g. 'ja')
    pub language_code: Option<String>,
    /// Request a step-by-step solution for math problems
    pub show_steps: Option<bool>,
}

impl FromArguments for WolframQueryTool {
    fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, AppError> {
        let mut reader = ArgumentReader::new(arguments);
        let query = reader.required_string("query");
        let decoded = Self {
            query,
            max_chars: Some(reader.optional_integer("max_chars")).filter(|max| *max > 0),
            units: Units::parse(&reader.optional_string("units")),
            country_code: non_blank(reader.optional_string("country_code")),
            language_code: non_blank(reader.optional_string("language_code")),
            show_steps: reader.optional_bool("show_steps").then_some(true),
        };
        reader.finish(decoded)
    }
}

impl WolframQueryTool {
    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            max_chars: self.max_chars.unwrap_or_default(),
            units: self.units,
            country_code: self.country_code.clone(),
            language_code: self.language_code.clone(),
            show_steps: self.show_steps.unwrap_or_default(),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|value| !value.trim().is_empty())
}

pub struct GreetingHello {
    greeter: Arc<dyn Greeter>,
}

impl GreetingHello {
    pub fn new(greeter: Arc<dyn Greeter>) -> Self {
        Self { greeter }
    }
}

#[async_trait]
impl ToolHandler for GreetingHello {
    fn descriptor(&self) -> Tool {
        GreetingHelloTool::tool()
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<String, AppError> {
        let args = GreetingHelloTool::from_arguments(arguments)?;
        let name = args.name.unwrap_or_default();
        debug!(name = %name, "executing greeting/hello");

        Ok(self.greeter.generate_greeting(&name))
    }
}

pub struct WolframQuery {
    executor: Arc<dyn QueryExecutor>,
}

impl WolframQuery {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for WolframQuery {
    fn descriptor(&self) -> Tool {
        WolframQueryTool::tool()
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<String, AppError> {
        let args = WolframQueryTool::from_arguments(arguments)?;
        let options = args.options();
        debug!(
            query = %args.query,
            max_chars = options.max_chars,
            units = options.units.map(|units| units.as_str()),
            country_code = options.country_code.as_deref(),
            language_code = options.language_code.as_deref(),
            show_steps = options.show_steps,
            "executing wolfram_query"
        );

        let result = self.executor.execute_query(&args.query, Some(options)).await?;
        debug!(query = %args.query, result_length = result.len(), "wolfram_query executed");
        Ok(result)
    }
}
