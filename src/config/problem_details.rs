// Start of file: /src/config/problem_details.rs

// * Settings of the problem details response factory and middleware.
// * Fixed once the factory is built.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use axum::http::StatusCode;
use tracing::level_filters::LevelFilter;

use crate::utils::json::JsonFlags;

// ! Detail shown for generic errors outside debug mode
pub const DEFAULT_DETAIL_MESSAGE: &str = "An unknown error occurred.";

#[derive(Debug, Clone, PartialEq)]
pub struct ProblemDetailsConfig {
    /// Attach exception traces and pretty-print JSON.
    pub debug: bool,
    /// Replaces the default JSON flags entirely when set.
    pub json_flags: Option<JsonFlags>,
    /// Show raw error messages even outside debug mode.
    pub expose_detail: bool,
    pub default_detail_message: String,
    pub default_types_map: HashMap<StatusCode, String>,
    /// Diagnostics at or above this level fail the request.
    pub trap_level: LevelFilter,
}

impl Default for ProblemDetailsConfig {
    fn default() -> Self {
        Self {
            debug: false,
            json_flags: None,
            expose_detail: false,
            default_detail_message: DEFAULT_DETAIL_MESSAGE.to_owned(),
            default_types_map: HashMap::new(),
            trap_level: LevelFilter::ERROR,
        }
    }
}

impl ProblemDetailsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn json_flags(mut self, flags: JsonFlags) -> Self {
        self.json_flags = Some(flags);
        self
    }

    pub fn expose_detail(mut self, expose: bool) -> Self {
        self.expose_detail = expose;
        self
    }

    pub fn default_detail_message(mut self, message: impl Into<String>) -> Self {
        self.default_detail_message = message.into();
        self
    }

    pub fn default_type(mut self, status: StatusCode, type_uri: impl Into<String>) -> Self {
        self.default_types_map.insert(status, type_uri.into());
        self
    }

    pub fn default_types_map(mut self, map: HashMap<StatusCode, String>) -> Self {
        self.default_types_map = map;
        self
    }

    pub fn trap_level(mut self, level: LevelFilter) -> Self {
        self.trap_level = level;
        self
    }

    /// Flags the JSON encoder actually uses.
    pub fn effective_json_flags(&self) -> JsonFlags {
        self.json_flags.unwrap_or_else(|| JsonFlags::for_debug(self.debug))
    }
}

/// Parses `404=https://example.com/not-found;500=https://example.com/error`.
/// Entries may also be separated by commas; blank entries are skipped.
pub fn parse_types_map(raw: &str) -> Result<HashMap<StatusCode, String>> {
    let mut map: HashMap<StatusCode, String> = HashMap::new();

    for entry in raw.split([';', ',']).map(str::trim).filter(|entry| !entry.is_empty()) {
        let (status, uri) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid default type entry '{entry}', expected STATUS=URI"))?;

        let code: u16 = status
            .trim()
            .parse()
            .with_context(|| format!("Invalid status code in default type entry '{entry}'"))?;
        let status: StatusCode = StatusCode::from_u16(code)
            .with_context(|| format!("Status code out of range in default type entry '{entry}'"))?;

        map.insert(status, uri.trim().to_owned());
    }

    Ok(map)
}

// End of file: /src/config/problem_details.rs
