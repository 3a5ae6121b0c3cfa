//! Parser configuration
//!
//! Read-only settings shared by every `try_parse` call. Built once, then passed
//! by reference.

use std::time::Duration;

use crate::custom::CustomParsers;

/// Timeout assumed for a request when the transport supplies none
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on signatures accepted per message
pub const DEFAULT_MAX_SIGNATURES: usize = 16;

/// Settings for parsing envelopes
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Timeout applied to parsed requests without an explicit one
    pub default_request_timeout: Duration,

    /// Honour an in-body `chargingStationId` over the transport-supplied origin
    pub allow_sender_override: bool,

    /// Messages with more signatures are rejected
    pub max_signatures: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_request_timeout: DEFAULT_REQUEST_TIMEOUT,
            allow_sender_override: true,
            max_signatures: DEFAULT_MAX_SIGNATURES,
        }
    }
}

impl ParserConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.default_request_timeout = timeout;
        self
    }

    pub fn without_sender_override(mut self) -> Self {
        self.allow_sender_override = false;
        self
    }

    pub fn with_max_signatures(mut self, max: usize) -> Self {
        self.max_signatures = max;
        self
    }
}

/// Everything a `try_parse` call needs besides the JSON and its correlation ids
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub config: ParserConfig,
    pub parsers: CustomParsers,
}

impl ParseOptions {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            parsers: CustomParsers::none(),
        }
    }

    pub fn with_parsers(mut self, parsers: CustomParsers) -> Self {
        self.parsers = parsers;
        self
    }
}
