use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::Tool;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::errors::AppError;

/// A named operation the server exposes through `tools/call`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> Tool;

    async fn call(&self, arguments: &Map<String, Value>) -> Result<String, AppError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool {name:?} is already registered")]
    DuplicateTool { name: String },
}

struct RegisteredTool {
    descriptor: Tool,
    handler: Arc<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let descriptor = handler.descriptor();
        if self.get(&descriptor.name).is_some() {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name,
            });
        }

        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools
            .iter()
            .find(|tool| tool.descriptor.name == name)
            .map(|tool| Arc::clone(&tool.handler))
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
