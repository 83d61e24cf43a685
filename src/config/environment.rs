// Start of file: /src/config/environment.rs

// * Environment configuration loaded once behind a singleton.
// * Covers the demo server bind/limits and the problem details settings.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;
use tracing::warn;

use crate::config::problem_details::{parse_types_map, ProblemDetailsConfig};
use crate::utils::json::JsonFlags;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 3; // 3 seconds

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub problem_details: ProblemDetailsConfig,
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        // * A small helper closure to fetch a variable by key
        let get_var = |key: &str| vars.get(key).map(String::as_str).filter(|value| !value.trim().is_empty());

        let environment: Cow<'static, str> = get_var("ENVIRONMENT")
            .map(|s| Cow::Owned(s.into()))
            .unwrap_or_else(|| {
                warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                Cow::Borrowed(DEFAULT_ENVIRONMENT)
            });

        let is_production: bool = environment == "production";

        let mut problem_details: ProblemDetailsConfig = ProblemDetailsConfig::new()
            .debug(
                get_var("PROBLEM_DETAILS_DEBUG")
                    .map(|s| parse_bool(s).context("Invalid PROBLEM_DETAILS_DEBUG"))
                    .transpose()?
                    .unwrap_or(!is_production),
            )
            .expose_detail(
                get_var("PROBLEM_DETAILS_EXPOSE_DETAIL")
                    .map(|s| parse_bool(s).context("Invalid PROBLEM_DETAILS_EXPOSE_DETAIL"))
                    .transpose()?
                    .unwrap_or(false),
            )
            .trap_level(
                get_var("PROBLEM_DETAILS_TRAP_LEVEL")
                    .map(|s| s.trim().parse::<LevelFilter>().context("Invalid PROBLEM_DETAILS_TRAP_LEVEL"))
                    .transpose()?
                    .unwrap_or(LevelFilter::ERROR),
            );

        if let Some(flags) = get_var("PROBLEM_DETAILS_JSON_FLAGS") {
            let flags: JsonFlags = flags.parse().context("Invalid PROBLEM_DETAILS_JSON_FLAGS")?;
            problem_details = problem_details.json_flags(flags);
        }

        if let Some(message) = get_var("PROBLEM_DETAILS_DEFAULT_DETAIL") {
            problem_details = problem_details.default_detail_message(message);
        }

        if let Some(types) = get_var("PROBLEM_DETAILS_DEFAULT_TYPES") {
            let types_map = parse_types_map(types).context("Invalid PROBLEM_DETAILS_DEFAULT_TYPES")?;
            problem_details = problem_details.default_types_map(types_map);
        }

        Ok(Self {
            environment,

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            problem_details,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    // * Returns a reference to the lazily-initialized environment configuration
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<EnvironmentVariables, String>> = Lazy::new(|| {
            let config: Result<EnvironmentVariables, String> =
                EnvironmentVariables::load().map_err(|err| format!("{err:#}"));

            if let Ok(config) = &config {
                tracing::debug!("Loaded environment configuration: {:#?}", config);
            }

            config
        });

        INSTANCE
            .as_ref()
            .map_err(|err| anyhow::anyhow!("Failed to load environment configuration: {err}"))
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean, got '{other}'")),
    }
}

// End of file: /src/config/environment.rs
