use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://www.wolframalpha.com";
const LLM_API_PATH: &str = "/api/v1/llm-api";
const USER_AGENT: &str = concat!("mcp-wolfram-alpha/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Nonmetric,
}

impl Units {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metric" => Some(Self::Metric),
            "nonmetric" => Some(Self::Nonmetric),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Nonmetric => "nonmetric",
        }
    }

    /// Schema fragment embedded in tool input schemas.
    pub fn json_schema() -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("string"));
        schema.insert(
            "enum".to_string(),
            json!([Self::Metric.as_str(), Self::Nonmetric.as_str()]),
        );
        schema
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmQuery {
    pub input: String,
    pub max_chars: u32,
    pub units: Option<Units>,
    pub country_code: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication rejected (status {status}): {body}")]
    Auth { status: u16, body: String },
    #[error("input rejected (status {status}): {body}")]
    InvalidInput { status: u16, body: String },
    #[error("server failure (status {status}): {body}")]
    Server { status: u16, body: String },
    #[error("{message}")]
    Network { message: String, timed_out: bool },
    #[error("{message}")]
    Other { status: Option<u16>, message: String },
}

impl ClientError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_invalid_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { timed_out: true, .. })
    }
}

#[async_trait]
pub trait LlmApi: Send + Sync {
    async fn query(&self, query: &LlmQuery) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    http: Client,
    app_id: String,
    use_bearer: bool,
    endpoint: String,
}

impl HttpLlmClient {
    pub fn new(app_id: String, timeout: Duration, use_bearer: bool) -> Result<Self, ClientError> {
        Self::with_base_url(app_id, timeout, use_bearer, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        app_id: String,
        timeout: Duration,
        use_bearer: bool,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ClientError::Other {
                status: None,
                message: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            http,
            app_id,
            use_bearer,
            endpoint: format!("{}{LLM_API_PATH}", base_url.trim_end_matches('/')),
        })
    }

    pub fn build_request(&self, query: &LlmQuery) -> Result<reqwest::Request, ClientError> {
        let mut params: Vec<(&str, String)> = vec![
            ("input", query.input.clone()),
            ("maxchars", query.max_chars.to_string()),
        ];
        if let Some(units) = query.units {
            params.push(("units", units.as_str().to_string()));
        }
        if let Some(country_code) = &query.country_code {
            params.push(("countrycode", country_code.clone()));
        }
        if let Some(language_code) = &query.language_code {
            params.push(("languagecode", language_code.clone()));
        }

        let mut builder = self.http.get(&self.endpoint);
        if self.use_bearer {
            builder = builder.bearer_auth(&self.app_id);
        } else {
            params.push(("appid", self.app_id.clone()));
        }

        builder.query(&params).build().map_err(|err| ClientError::Other {
            status: None,
            message: format!("failed to build request: {err}"),
        })
    }
}

#[async_trait]
impl LlmApi for HttpLlmClient {
    async fn query(&self, query: &LlmQuery) -> Result<String, ClientError> {
        let request = self.build_request(query)?;
        let response = self.http.execute(request).await.map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(classify_status(status, body));
        }

        Ok(body)
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Network {
        timed_out: err.is_timeout(),
        message: err.to_string(),
    }
}

fn classify_status(status: StatusCode, body: String) -> ClientError {
    let code = status.as_u16();
    let body = body.trim().to_string();
    match code {
        401 | 403 => ClientError::Auth { status: code, body },
        400 | 501 => ClientError::InvalidInput { status: code, body },
        _ if status.is_server_error() => ClientError::Server { status: code, body },
        _ => ClientError::Other {
            status: Some(code),
            message: format!("unexpected response status {status}"),
        },
    }
}
