//! Wire types for OSRM-compatible `route` responses.
//!
//! Only the fields the planner needs are modelled. Geometry is requested as
//! GeoJSON, so coordinates arrive as `[lng, lat]` pairs.

use chrono::Duration;
use serde::Deserialize;

use crate::domain::{Location, RoutePath};

use super::RouteEstimate;
use super::error::RouteError;

/// Top-level `route` service response.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteResponse {
    /// `"Ok"` on success, otherwise an error code such as `"NoRoute"`
    pub code: String,

    /// Human-readable error description
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub routes: Vec<RouteDto>,
}

/// One candidate route.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDto {
    /// Travel time in seconds
    pub duration: f64,

    /// Distance in metres
    #[serde(default)]
    pub distance: f64,

    pub geometry: GeometryDto,
}

/// GeoJSON `LineString`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryDto {
    #[serde(rename = "type")]
    pub kind: String,

    pub coordinates: Vec<[f64; 2]>,
}

impl RouteResponse {
    /// Convert the first route into an estimate.
    pub fn into_estimate(self) -> Result<RouteEstimate, RouteError> {
        if self.code != "Ok" {
            let message = self.message.unwrap_or_else(|| self.code.clone());
            return Err(RouteError::NoRoute(message));
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteError::NoRoute("response contained no routes".to_string()))?;

        if !route.duration.is_finite() || route.duration < 0.0 {
            return Err(RouteError::Json {
                message: format!("invalid route duration: {}", route.duration),
                body: None,
            });
        }
        let travel = Duration::milliseconds((route.duration * 1000.0).round() as i64);

        if route.geometry.kind != "LineString" {
            return Err(RouteError::Json {
                message: format!("unexpected geometry type: {}", route.geometry.kind),
                body: None,
            });
        }

        let points = route
            .geometry
            .coordinates
            .iter()
            .map(|[lng, lat]| Location::new(*lat, *lng))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RouteError::Json {
                message: e.to_string(),
                body: None,
            })?;

        Ok(RouteEstimate {
            path: RoutePath::new(points),
            travel,
        })
    }
}
