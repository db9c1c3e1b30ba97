//! Request plumbing shared by the HTTP adapters.

use reqwest::{header, Client, RequestBuilder, StatusCode};
use tracing::debug;

use crate::errors::MarketDataError;

use super::capabilities::SourceOptions;

/// Build a client with the configured timeout and user agent.
pub(crate) fn build_client(provider: &str, options: &SourceOptions) -> Result<Client, MarketDataError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .timeout(options.timeout)
        .user_agent(options.user_agent.as_str())
        .default_headers(headers)
        .build()
        .map_err(|e| MarketDataError::Transport {
            provider: provider.to_string(),
            message: format!("Failed to build HTTP client: {}", e),
        })
}

/// Send a request and return the body of a successful response.
///
/// `subject` names the symbol or identifiers being requested; a 404 is
/// reported as [`MarketDataError::SymbolNotFound`] for it.
pub(crate) async fn send_for_text(
    provider: &str,
    subject: &str,
    request: RequestBuilder,
) -> Result<String, MarketDataError> {
    let response = request
        .send()
        .await
        .map_err(|e| MarketDataError::from_reqwest(provider, e))?;

    let status = response.status();
    debug!("{} {} -> {}", provider, subject, status);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(MarketDataError::SymbolNotFound(subject.to_string()));
    }

    if !status.is_success() {
        return Err(MarketDataError::HttpStatus {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| MarketDataError::from_reqwest(provider, e))
}
