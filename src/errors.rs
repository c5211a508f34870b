use std::fmt;

use thiserror::Error;

use crate::wolfram_client::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Empty,
    WrongType { expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::Empty => write!(f, "{} cannot be empty", self.field),
            FieldProblem::WrongType { expected } => {
                write!(f, "{} must be {expected}", self.field)
            }
        }
    }
}

/// Per-request failures. None of these stop the server; they are turned
/// into protocol responses at the dispatch boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid arguments: {}", join_fields(.fields))]
    Validation { fields: Vec<FieldError> },
    #[error("authentication error with Wolfram Alpha API: {source}")]
    RemoteAuth { source: ClientError },
    #[error("invalid input for Wolfram Alpha API: {source}")]
    RemoteInvalidInput { source: ClientError },
    #[error("Wolfram Alpha server error: {source}")]
    RemoteServer { source: ClientError },
    #[error("network error while connecting to Wolfram Alpha: {source}")]
    RemoteNetwork { source: ClientError },
    #[error("failed to execute Wolfram Alpha query: {source}")]
    RemoteGeneric { source: ClientError },
}

impl AppError {
    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self::Validation { fields }
    }

    /// Wraps a client failure into the matching remote kind.
    pub fn from_client(source: ClientError) -> Self {
        if source.is_auth_error() {
            Self::RemoteAuth { source }
        } else if source.is_invalid_input_error() {
            Self::RemoteInvalidInput { source }
        } else if source.is_server_error() {
            Self::RemoteServer { source }
        } else if source.is_network_error() {
            Self::RemoteNetwork { source }
        } else {
            Self::RemoteGeneric { source }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_arguments",
            Self::RemoteAuth { .. } => "remote_auth_error",
            Self::RemoteInvalidInput { .. } => "remote_invalid_input",
            Self::RemoteServer { .. } => "remote_server_error",
            Self::RemoteNetwork { .. } => "remote_network_error",
            Self::RemoteGeneric { .. } => "remote_error",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = AppError::validation(vec![
            FieldError {
                field: "query",
                problem: FieldProblem::Missing,
            },
            FieldError {
                field: "name",
                problem: FieldProblem::WrongType {
                    expected: "a string",
                },
            },
        ]);

        assert_eq!(
            err.to_string(),
            "invalid arguments: query is required, name must be a string"
        );
        assert!(err.is_validation());
        assert_eq!(err.code(), "invalid_arguments");
    }

    #[test]
    fn client_errors_map_to_remote_kinds() {
        let auth = AppError::from_client(ClientError::Auth {
            status: 403,
            body: "Invalid appid".to_string(),
        });
        assert!(matches!(auth, AppError::RemoteAuth { .. }));
        assert!(auth
            .to_string()
            .starts_with("authentication error with Wolfram Alpha API"));

        let input = AppError::from_client(ClientError::InvalidInput {
            status: 501,
            body: "could not understand".to_string(),
        });
        assert!(matches!(input, AppError::RemoteInvalidInput { .. }));

        let server = AppError::from_client(ClientError::Server {
            status: 503,
            body: String::new(),
        });
        assert!(matches!(server, AppError::RemoteServer { .. }));

        let other = AppError::from_client(ClientError::Other {
            status: Some(302),
            message: "unexpected redirect".to_string(),
        });
        assert!(matches!(other, AppError::RemoteGeneric { .. }));
        assert_eq!(other.code(), "remote_error");
    }
}
