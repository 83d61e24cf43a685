// Start of file: /src/config/state.rs

// * Shared application state for the demo server

use std::sync::Arc;

use crate::config::environment::EnvironmentVariables;
use crate::response::factory::ProblemDetailsResponseFactory;

#[derive(Debug, Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub factory: Arc<ProblemDetailsResponseFactory>,
}

impl AppState {
    /// Builds the state from already loaded variables.
    pub fn new(environment: EnvironmentVariables) -> Self {
        let factory: ProblemDetailsResponseFactory =
            ProblemDetailsResponseFactory::new(environment.problem_details.clone());

        Self {
            environment: Arc::new(environment),
            factory: Arc::new(factory),
        }
    }

    /// Builds the state from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let environment: &'static EnvironmentVariables = EnvironmentVariables::instance()?;
        Ok(Self::new(environment.clone()))
    }
}

// End of file: /src/config/state.rs
