//! Geographic positions and route geometry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a coordinate pair is not a valid position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location: {reason}")]
pub struct InvalidLocation {
    reason: &'static str,
}

/// A WGS84 latitude/longitude pair.
///
/// Latitude is within `[-90, 90]` and longitude within `[-180, 180]`;
/// both are finite. Any `Location` value is valid by construction.
///
/// # Examples
///
/// ```
/// use day_planner::domain::Location;
///
/// let taipei = Location::new(25.046, 121.517).unwrap();
/// assert_eq!(taipei.lat(), 25.046);
///
/// assert!(Location::new(91.0, 0.0).is_err());
/// assert!(Location::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    lat: f64,
    lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidLocation> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(InvalidLocation {
                reason: "coordinates must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidLocation {
                reason: "latitude must be within -90..=90",
            });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidLocation {
                reason: "longitude must be within -180..=180",
            });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Hashable key with microdegree precision (about 0.1 m).
    pub fn key(&self) -> LocationKey {
        LocationKey(
            (self.lat * 1e6).round() as i64,
            (self.lng * 1e6).round() as i64,
        )
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            lat: f64,
            lng: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Location::new(raw.lat, raw.lng).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({}, {})", self.lat, self.lng)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Integer form of a [`Location`] usable as a map/cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey(i64, i64);

/// Path geometry of a travel segment, in travel order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RoutePath(Vec<Location>);

impl RoutePath {
    pub fn new(points: Vec<Location>) -> Self {
        Self(points)
    }

    /// A two-point path, for collaborators that do not return geometry.
    pub fn straight(from: Location, to: Location) -> Self {
        Self(vec![from, to])
    }

    pub fn points(&self) -> &[Location] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
