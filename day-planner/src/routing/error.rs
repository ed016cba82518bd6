//! Route lookup error types.

/// Errors from a route lookup.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// HTTP request failed (network error, connection refused, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be understood
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Routing service returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// No route exists between the two locations
    #[error("no route found: {0}")]
    NoRoute(String),

    /// Rate limited by the routing service
    #[error("rate limited by routing service")]
    RateLimited,

    /// The lookup did not answer in time
    #[error("route lookup timed out after {0:?}")]
    Timeout(std::time::Duration),
}
