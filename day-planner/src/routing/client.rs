//! HTTP client for OSRM-compatible routing servers.
//!
//! Issues `GET {base}/route/v1/{profile}/{lng},{lat};{lng},{lat}` requests
//! with full GeoJSON geometry and converts the first route into a
//! [`RouteEstimate`].

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::Location;

use super::error::RouteError;
use super::types::RouteResponse;
use super::{RouteEstimate, RouteLookup};

/// Default base URL (the public OSRM demo server).
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default routing profile.
const DEFAULT_PROFILE: &str = "driving";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct RouteClientConfig {
    /// Base URL of the routing server
    pub base_url: String,
    /// Routing profile (`driving`, `walking`, `cycling`, …)
    pub profile: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RouteClientConfig {
    /// Create a config pointing at the given server.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for RouteClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }
}

/// Routing service client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct RouteClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    semaphore: Arc<Semaphore>,
}

impl RouteClient {
    /// Create a new routing client with the given configuration.
    pub fn new(config: RouteClientConfig) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn route_url(&self, from: Location, to: Location) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url,
            self.profile,
            from.lng(),
            from.lat(),
            to.lng(),
            to.lat()
        )
    }

    /// Fetch the route between two locations.
    pub async fn get_route(
        &self,
        from: Location,
        to: Location,
    ) -> Result<RouteEstimate, RouteError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RouteError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.route_url(from, to);
        debug!(%url, "requesting route");

        let response = self
            .http
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RouteError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM reports "no route" as a 400 with a JSON body, so try to
        // read the body before giving up on a non-success status.
        match serde_json::from_str::<RouteResponse>(&body) {
            Ok(parsed) if status.is_success() || parsed.code != "Ok" => parsed.into_estimate(),
            Ok(_) => Err(RouteError::Api {
                status: status.as_u16(),
                message: body,
            }),
            Err(_) if !status.is_success() => Err(RouteError::Api {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(RouteError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            }),
        }
    }
}

impl RouteLookup for RouteClient {
    async fn lookup(&self, from: Location, to: Location) -> Result<RouteEstimate, RouteError> {
        self.get_route(from, to).await
    }
}
