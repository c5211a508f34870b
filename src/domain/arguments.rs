//! Schema-driven decoding of tool arguments
//!
//! Tool calls arrive with an untyped JSON argument map. Each tool struct
//! implements [`FromArguments`] on top of [`ArgumentReader`], which collects
//! every failing required field before reporting, and quietly falls back to
//! the zero value for optional fields that are absent or mistyped.

use serde_json::{Map, Value};

use crate::errors::{AppError, FieldError, FieldProblem};

pub trait FromArguments: Sized {
    fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, AppError>;
}

pub struct ArgumentReader<'a> {
    arguments: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> ArgumentReader<'a> {
    pub fn new(arguments: &'a Map<String, Value>) -> Self {
        Self {
            arguments,
            errors: Vec::new(),
        }
    }

    /// Present, a string, and not blank. Failures are recorded and an empty
    /// placeholder is returned so decoding can continue.
    pub fn required_string(&mut self, field: &'static str) -> String {
        let problem = match self.arguments.get(field) {
            None | Some(Value::Null) => FieldProblem::Missing,
            Some(Value::String(value)) if value.trim().is_empty() => FieldProblem::Empty,
            Some(Value::String(value)) => return value.clone(),
            Some(_) => FieldProblem::WrongType {
                expected: "a string",
            },
        };

        self.errors.push(FieldError { field, problem });
        String::new()
    }

    pub fn optional_string(&self, field: &str) -> String {
        self.arguments
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Integral JSON numbers only; `2000.0` counts, `12.5` does not.
    pub fn optional_integer(&self, field: &str) -> i64 {
        match self.arguments.get(field) {
            Some(Value::Number(number)) => number
                .as_i64()
                .or_else(|| {
                    number
                        .as_f64()
                        .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                        .map(|value| value as i64)
                })
                .unwrap_or_default(),
            _ => 0,
        }
    }

    pub fn optional_bool(&self, field: &str) -> bool {
        self.arguments
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    pub fn finish<T>(self, decoded: T) -> Result<T, AppError> {
        if self.errors.is_empty() {
            Ok(decoded)
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object arguments")
    }

    #[test]
    fn collects_every_failing_required_field() {
        let arguments = args(json!({ "b": "   ", "c": 7 }));
        let mut reader = ArgumentReader::new(&arguments);

        reader.required_string("a");
        reader.required_string("b");
        reader.required_string("c");

        let err = reader.finish(()).expect_err("expected validation error");
        let AppError::Validation { fields } = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError {
                    field: "a",
                    problem: FieldProblem::Missing
                },
                FieldError {
                    field: "b",
                    problem: FieldProblem::Empty
                },
                FieldError {
                    field: "c",
                    problem: FieldProblem::WrongType {
                        expected: "a string"
                    }
                },
            ]
        );
    }

    #[test]
    fn optional_fields_fall_back_on_wrong_types() {
        let arguments = args(json!({
            "name": 42,
            "limit": "many",
            "verbose": "yes",
        }));
        let reader = ArgumentReader::new(&arguments);

        assert_eq!(reader.optional_string("name"), "");
        assert_eq!(reader.optional_string("absent"), "");
        assert_eq!(reader.optional_integer("limit"), 0);
        assert!(!reader.optional_bool("verbose"));
        assert!(reader.finish(()).is_ok());
    }

    #[test]
    fn optional_integer_accepts_integral_floats() {
        let arguments = args(json!({ "whole": 2000.0, "fraction": 12.5, "int": -3 }));
        let reader = ArgumentReader::new(&arguments);

        assert_eq!(reader.optional_integer("whole"), 2000);
        assert_eq!(reader.optional_integer("fraction"), 0);
        assert_eq!(reader.optional_integer("int"), -3);
    }
}
