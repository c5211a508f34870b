//! Query provider backed by the Wolfram|Alpha LLM API

use std::{any::Any, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::{
    config::{ConfigError, WolframConfig},
    errors::AppError,
    wolfram_client::{HttpLlmClient, LlmApi, LlmQuery, Units},
};

/// Wolfram|Alpha convention for requesting a step-by-step solution.
pub const SHOW_STEPS_PREFIX: &str = "show steps ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Zero or negative means "use the configured default".
    pub max_chars: i64,
    pub units: Option<Units>,
    pub country_code: Option<String>,
    pub language_code: Option<String>,
    pub show_steps: bool,
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute_query(
        &self,
        query: &str,
        options: Option<QueryOptions>,
    ) -> Result<String, AppError>;
}

pub struct WolframService {
    client: Arc<dyn LlmApi>,
    default_max_chars: u32,
}

impl WolframService {
    pub fn from_config(config: &WolframConfig) -> Result<Self, ConfigError> {
        let app_id = require_app_id(config)?;
        let client = HttpLlmClient::new(app_id, config.timeout(), config.use_bearer).map_err(
            |err| ConfigError::HttpClient {
                message: err.to_string(),
            },
        )?;

        Self::new(config, Arc::new(client))
    }

    pub fn new(config: &WolframConfig, client: Arc<dyn LlmApi>) -> Result<Self, ConfigError> {
        require_app_id(config)?;

        info!(
            app_id_set = true,
            timeout_secs = config.timeout,
            use_bearer = config.use_bearer,
            default_max_chars = config.default_max_chars,
            "creating Wolfram Alpha service"
        );

        Ok(Self {
            client,
            default_max_chars: config.default_max_chars,
        })
    }
}

#[async_trait]
impl QueryExecutor for WolframService {
    async fn execute_query(
        &self,
        query: &str,
        options: Option<QueryOptions>,
    ) -> Result<String, AppError> {
        let options = options.unwrap_or_default();
        let max_chars = resolve_max_chars(Some(&options as &dyn Any), self.default_max_chars);

        let input = if options.show_steps {
            format!("{SHOW_STEPS_PREFIX}{query}")
        } else {
            query.to_string()
        };

        debug!(query = %input, max_chars, "executing Wolfram Alpha query");

        let request = LlmQuery {
            input,
            max_chars,
            units: options.units,
            country_code: non_empty(options.country_code),
            language_code: non_empty(options.language_code),
        };

        match self.client.query(&request).await {
            Ok(result) => {
                debug!(
                    query = %request.input,
                    result_length = result.len(),
                    "received Wolfram Alpha response"
                );
                Ok(result)
            }
            Err(err) => {
                error!(
                    query = %request.input,
                    timed_out = err.is_timeout(),
                    error = %err,
                    "Wolfram Alpha query failed"
                );
                Err(AppError::from_client(err))
            }
        }
    }
}

/// Returns the caller's `max_chars` when `options` is a [`QueryOptions`]
/// with a positive value, the configured default otherwise. Values of any
/// other type are accepted and ignored.
pub fn resolve_max_chars(options: Option<&dyn Any>, default_max_chars: u32) -> u32 {
    options
        .and_then(|options| options.downcast_ref::<QueryOptions>())
        .map(|options| options.max_chars)
        .filter(|max_chars| *max_chars > 0)
        .map(|max_chars| u32::try_from(max_chars).unwrap_or(u32::MAX))
        .unwrap_or(default_max_chars)
}

fn require_app_id(config: &WolframConfig) -> Result<String, ConfigError> {
    let app_id = config.app_id.trim();
    if app_id.is_empty() {
        return Err(ConfigError::MissingAppId);
    }
    Ok(app_id.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::wolfram_client::ClientError;

    #[derive(Default)]
    struct RecordingClient {
        queries: Mutex<Vec<LlmQuery>>,
        failure: Mutex<Option<ClientError>>,
    }

    impl RecordingClient {
        fn failing(err: ClientError) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                failure: Mutex::new(Some(err)),
            }
        }

        fn recorded(&self) -> Vec<LlmQuery> {
            self.queries.lock().expect("queries lock").clone()
        }
    }

    #[async_trait]
    impl LlmApi for RecordingClient {
        async fn query(&self, query: &LlmQuery) -> Result<String, ClientError> {
            self.queries.lock().expect("queries lock").push(query.clone());
            match self.failure.lock().expect("failure lock").take() {
                Some(err) => Err(err),
                None => Ok(format!("result for {}", query.input)),
            }
        }
    }

    fn config(default_max_chars: u32) -> WolframConfig {
        WolframConfig {
            app_id: "test-app".to_string(),
            default_max_chars,
            ..WolframConfig::default()
        }
    }

    #[test]
    fn empty_app_id_is_rejected() {
        for app_id in ["", "   "] {
            let config = WolframConfig {
                app_id: app_id.to_string(),
                ..WolframConfig::default()
            };

            let err = WolframService::new(&config, Arc::new(RecordingClient::default()))
                .err()
                .expect("expected missing app id");
            assert!(matches!(err, ConfigError::MissingAppId));
            assert!(err.to_string().contains("AppID is required"));

            let err = WolframService::from_config(&config)
                .err()
                .expect("expected missing app id");
            assert!(matches!(err, ConfigError::MissingAppId));
        }
    }

    #[test]
    fn max_chars_falls_back_to_default() {
        assert_eq!(resolve_max_chars(None, 2000), 2000);

        let unset = QueryOptions::default();
        assert_eq!(resolve_max_chars(Some(&unset), 2000), 2000);

        let negative = QueryOptions {
            max_chars: -5,
            ..QueryOptions::default()
        };
        assert_eq!(resolve_max_chars(Some(&negative), 2000), 2000);

        let explicit = QueryOptions {
            max_chars: 500,
            ..QueryOptions::default()
        };
        assert_eq!(resolve_max_chars(Some(&explicit), 2000), 500);
    }

    #[test]
    fn max_chars_ignores_unrelated_option_types() {
        let unrelated = String::from("max_chars=500");
        assert_eq!(resolve_max_chars(Some(&unrelated), 2000), 2000);
        assert_eq!(resolve_max_chars(Some(&500_i64), 1200), 1200);
    }

    #[tokio::test]
    async fn query_without_options_uses_configured_default() {
        let client = Arc::new(RecordingClient::default());
        let service = WolframService::new(&config(2000), client.clone()).expect("service");

        let result = service
            .execute_query("integrate x^2", None)
            .await
            .expect("query should succeed");

        assert_eq!(result, "result for integrate x^2");
        let recorded = client.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].max_chars, 2000);
        assert_eq!(recorded[0].units, None);
    }

    #[tokio::test]
    async fn show_steps_only_prefixes_the_query() {
        let client = Arc::new(RecordingClient::default());
        let service = WolframService::new(&config(2000), client.clone()).expect("service");
        let options = QueryOptions {
            max_chars: 300,
            units: Some(Units::Metric),
            country_code: Some("JP".to_string()),
            language_code: Some("ja".to_string()),
            show_steps: false,
        };

        service
            .execute_query("solve x^2 = 4", Some(options.clone()))
            .await
            .expect("plain query");
        service
            .execute_query(
                "solve x^2 = 4",
                Some(QueryOptions {
                    show_steps: true,
                    ..options
                }),
            )
            .await
            .expect("steps query");

        let recorded = client.recorded();
        assert_eq!(recorded[0].input, "solve x^2 = 4");
        assert_eq!(recorded[1].input, "show steps solve x^2 = 4");
        assert_eq!(
            LlmQuery {
                input: recorded[0].input.clone(),
                ..recorded[1].clone()
            },
            recorded[0]
        );
    }

    #[tokio::test]
    async fn blank_localization_codes_are_dropped() {
        let client = Arc::new(RecordingClient::default());
        let service = WolframService::new(&config(2000), client.clone()).expect("service");

        service
            .execute_query(
                "weather",
                Some(QueryOptions {
                    country_code: Some(" ".to_string()),
                    language_code: Some(String::new()),
                    ..QueryOptions::default()
                }),
            )
            .await
            .expect("query should succeed");

        let recorded = client.recorded();
        assert_eq!(recorded[0].country_code, None);
        assert_eq!(recorded[0].language_code, None);
    }

    #[tokio::test]
    async fn client_failures_are_classified() {
        let client = Arc::new(RecordingClient::failing(ClientError::Network {
            message: "operation timed out".to_string(),
            timed_out: true,
        }));
        let service = WolframService::new(&config(2000), client).expect("service");

        let err = service
            .execute_query("distance to Mars", None)
            .await
            .expect_err("query should fail");
        assert!(matches!(err, AppError::RemoteNetwork { .. }));
        assert!(err
            .to_string()
            .starts_with("network error while connecting to Wolfram Alpha"));
    }
}
