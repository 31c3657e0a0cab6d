//! Connection string parsing.
//!
//! Turns a `key=value;key=value` configuration string into validated
//! [`ConnectionParameters`]. Unknown keys are ignored so the format can grow
//! without breaking older parsers; the two required keys are checked strictly.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Path appended to the ingestion endpoint to reach the track API.
pub const TRACK_API_SUFFIX: &str = "v2.1/track";

const INSTRUMENTATION_KEY: &str = "instrumentationkey";
const INGESTION_ENDPOINT: &str = "ingestionendpoint";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("connection string cannot be empty")]
    Empty,

    #[error("invalid connection string format: {0}")]
    InvalidFormat(String),

    #[error("key in connection string cannot be empty")]
    EmptyKey,

    #[error("missing required fields in connection string: {0}")]
    MissingFields(String),
}

/// Validated parameters for connecting to the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionParameters {
    instrumentation_key: String,
    ingestion_url: String,
}

impl ConnectionParameters {
    pub fn instrumentation_key(&self) -> &str {
        &self.instrumentation_key
    }

    /// Full track URL, endpoint plus [`TRACK_API_SUFFIX`].
    pub fn ingestion_url(&self) -> &str {
        &self.ingestion_url
    }
}

impl fmt::Display for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstrumentationKey={};IngestionEndpoint={}",
            self.instrumentation_key, self.ingestion_url
        )
    }
}

impl FromStr for ConnectionParameters {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a connection string into [`ConnectionParameters`].
///
/// Keys are matched case-insensitively and a repeated key overwrites the
/// earlier value.
pub fn parse(connection_string: &str) -> Result<ConnectionParameters, ConnectionStringError> {
    if connection_string.is_empty() {
        return Err(ConnectionStringError::Empty);
    }

    let mut params = ConnectionParameters::default();

    for pair in connection_string.split(';') {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConnectionStringError::InvalidFormat(pair.to_string()))?;
        let (key, value) = (key.trim(), value.trim());

        if key.is_empty() {
            return Err(ConnectionStringError::EmptyKey);
        }

        match key.to_ascii_lowercase().as_str() {
            INSTRUMENTATION_KEY => params.instrumentation_key = value.to_string(),
            INGESTION_ENDPOINT => {
                if !value.is_empty() {
                    params.ingestion_url = format!("{}{}", value, TRACK_API_SUFFIX);
                }
            }
            _ => {}
        }
    }

    if params.instrumentation_key.is_empty() || params.ingestion_url.is_empty() {
        return Err(ConnectionStringError::MissingFields(params.to_string()));
    }

    Ok(params)
}
