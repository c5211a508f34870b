use tracing::info;

use crate::config::GreetingConfig;

pub trait Greeter: Send + Sync {
    fn generate_greeting(&self, name: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct GreetingService {
    default_message: String,
}

impl GreetingService {
    pub fn new(config: &GreetingConfig) -> Self {
        info!(
            default_message = %config.default_message,
            "creating greeting service"
        );

        Self {
            default_message: config.default_message.clone(),
        }
    }
}

impl Greeter for GreetingService {
    fn generate_greeting(&self, name: &str) -> String {
        if name.is_empty() {
            return self.default_message.clone();
        }

        format!("{} {}!", self.default_message, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(default_message: &str) -> GreetingService {
        GreetingService::new(&GreetingConfig {
            default_message: default_message.to_string(),
        })
    }

    #[test]
    fn empty_name_returns_default_message() {
        assert_eq!(service("Hello!").generate_greeting(""), "Hello!");
    }

    #[test]
    fn name_is_appended_with_exclamation() {
        assert_eq!(service("Hello!").generate_greeting("Tanaka"), "Hello! Tanaka!");
        assert_eq!(service("Hi!").generate_greeting("Smith"), "Hi! Smith!");
    }

    #[test]
    fn name_is_not_trimmed_or_reformatted() {
        assert_eq!(service("Hey").generate_greeting(" Ann "), "Hey  Ann !");
    }
}
