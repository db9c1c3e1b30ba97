//! Error types and classification for quote sources.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum returned by every [`QuoteSource`](crate::QuoteSource)
//! - [`SourceErrorKind`]: Transport vs protocol classification used for reporting

mod kind;

pub use kind::SourceErrorKind;

use thiserror::Error;

/// Errors that can occur while fetching quotes from an external source.
///
/// Each variant is classified into a [`SourceErrorKind`] via the [`kind`](Self::kind)
/// method. A source never returns a zero-valued quote in place of one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The request could not be delivered (DNS, connect, TLS, reset).
    #[error("Transport error: {provider} - {message}")]
    Transport {
        /// The provider that was being called
        provider: String,
        /// The underlying client error
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {status} from {provider}")]
    HttpStatus {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider does not know the requested symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The body could not be parsed into the provider's response shape.
    #[error("Malformed payload from {provider}: {message}")]
    MalformedPayload {
        /// The provider that returned the payload
        provider: String,
        /// Parse failure details
        message: String,
    },

    /// The request could not be built (empty symbol list, bad URL).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl MarketDataError {
    /// Returns the reporting classification for this error.
    ///
    /// ```
    /// use pricesync_market_data::errors::{MarketDataError, SourceErrorKind};
    ///
    /// let error = MarketDataError::Timeout { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.kind(), SourceErrorKind::Transport);
    ///
    /// let error = MarketDataError::RateLimited { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.kind(), SourceErrorKind::Protocol);
    /// ```
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => SourceErrorKind::Transport,

            Self::HttpStatus { .. }
            | Self::RateLimited { .. }
            | Self::SymbolNotFound(_)
            | Self::MalformedPayload { .. }
            | Self::InvalidRequest(_) => SourceErrorKind::Protocol,
        }
    }

    /// Map a `reqwest` failure onto the transport/protocol split.
    ///
    /// Timeouts keep their own variant. Body decode failures are protocol
    /// errors. Everything else that prevented a response is transport.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if err.is_decode() {
            Self::MalformedPayload {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kinds() {
        let transport = MarketDataError::Transport {
            provider: "YAHOO_QUOTE".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(transport.kind(), SourceErrorKind::Transport);

        let timeout = MarketDataError::Timeout {
            provider: "YAHOO_QUOTE".to_string(),
        };
        assert_eq!(timeout.kind(), SourceErrorKind::Transport);
    }

    #[test]
    fn test_protocol_kinds() {
        let errors = [
            MarketDataError::HttpStatus {
                provider: "YAHOO_CHART".to_string(),
                status: 502,
            },
            MarketDataError::RateLimited {
                provider: "COINGECKO".to_string(),
            },
            MarketDataError::SymbolNotFound("NOPE".to_string()),
            MarketDataError::malformed("COINGECKO", "expected object"),
            MarketDataError::InvalidRequest("no identifiers".to_string()),
        ];

        for error in errors {
            assert_eq!(error.kind(), SourceErrorKind::Protocol, "{}", error);
        }
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::HttpStatus {
            provider: "YAHOO_CHART".to_string(),
            status: 503,
        };
        assert_eq!(error.to_string(), "HTTP 503 from YAHOO_CHART");

        let error = MarketDataError::SymbolNotFound("ZZZZ".to_string());
        assert_eq!(error.to_string(), "Symbol not found: ZZZZ");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SourceErrorKind::Transport.to_string(), "transport");
        assert_eq!(SourceErrorKind::Protocol.to_string(), "protocol");
    }
}
