//! Route lookup between two stops.
//!
//! The planner asks a routing service for the path and travel time of each
//! segment. This module defines that seam ([`RouteLookup`]) and provides an
//! HTTP client for OSRM-compatible routing servers, a caching wrapper, and
//! a table-driven mock for tests.
//!
//! Key characteristics of the lookup:
//! - Lookups are network-bound and may fail or never answer; callers bound
//!   them with a timeout
//! - Travel times come back in seconds and are rounded to whole minutes
//!   before they reach a stop

mod cache;
mod client;
mod error;
mod mock;
mod types;

use std::future::Future;

use chrono::Duration;

use crate::domain::{Location, RoutePath};

pub use cache::{CacheConfig, CachedRouteLookup};
pub use client::{RouteClient, RouteClientConfig};
pub use error::RouteError;
pub use mock::MockRouteLookup;
pub use types::{GeometryDto, RouteDto, RouteResponse};

/// Path and travel time for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    pub path: RoutePath,
    pub travel: Duration,
}

/// A service that estimates travel between two locations.
///
/// This abstraction allows the planner to be tested without a routing
/// server.
pub trait RouteLookup: Send + Sync {
    /// Find a route from `from` to `to`.
    fn lookup(
        &self,
        from: Location,
        to: Location,
    ) -> impl Future<Output = Result<RouteEstimate, RouteError>> + Send;
}
