//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Location, RoutePath, Stop, StopKey};
use crate::itinerary::Itinerary;
use crate::planner::{FormInput, Notice, RenderCommand};

/// Request to add a stop, at the end or at a given id.
#[derive(Debug, Deserialize)]
pub struct AddStopRequest {
    /// Display name
    pub name: String,

    /// Where the stop is
    pub location: Location,

    /// Start time for the first stop, stay for the others
    #[serde(flatten)]
    pub input: FormInput,
}

/// Request to change a stop's stay.
#[derive(Debug, Deserialize)]
pub struct DurationRequest {
    pub hours: String,
    pub minutes: String,
}

/// Request to move the day's departure.
#[derive(Debug, Deserialize)]
pub struct StartTimeRequest {
    /// Departure in `HH:MM`
    pub start_time: String,
}

/// Offset into a feed.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Number of entries the client has already seen
    #[serde(default)]
    pub after: usize,
}

/// A stop as shown to clients.
#[derive(Debug, Serialize)]
pub struct StopView {
    /// Identity that survives renumbering
    pub key: StopKey,

    /// Position, starting at 1
    pub id: usize,

    pub name: String,
    pub location: Location,

    /// Arrival time (`HH:MM`)
    pub start_time: Option<String>,

    /// Departure time (`HH:MM`)
    pub end_time: Option<String>,

    /// Stay length
    pub duration: String,

    /// Travel time to the next stop, if known
    pub travel_to_next: Option<String>,

    /// Route to the next stop, if known
    pub route_to_next: Option<RoutePath>,
}

impl StopView {
    /// Create from a domain Stop.
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            key: stop.key(),
            id: stop.id(),
            name: stop.name().to_string(),
            location: stop.location(),
            start_time: stop.start_time().map(|t| t.text().to_string()),
            end_time: stop.end_time().map(|t| t.text().to_string()),
            duration: stop.duration().text().to_string(),
            travel_to_next: stop.travel_to_next().map(|t| t.text().to_string()),
            route_to_next: stop.route_to_next().cloned(),
        }
    }
}

/// The whole day.
#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    pub stops: Vec<StopView>,
}

impl ItineraryResponse {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            stops: itinerary.iter().map(StopView::from_stop).collect(),
        }
    }
}

/// Response for a new stop.
#[derive(Debug, Serialize)]
pub struct StopCreatedResponse {
    pub key: StopKey,
    pub id: usize,
}

/// Response for a removed stop.
#[derive(Debug, Serialize)]
pub struct StopRemovedResponse {
    pub removed: StopView,
}

/// Response for a retry of failed lookups.
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    /// Segments that now have a travel time
    pub repaired: usize,
}

/// Render commands after an offset.
#[derive(Debug, Serialize)]
pub struct RenderFeedResponse {
    /// Offset to pass as `after` next time
    pub next: usize,

    /// Entries after `after` that were dropped before this request
    pub missed: usize,

    pub commands: Vec<RenderCommand>,
}

/// Notices after an offset.
#[derive(Debug, Serialize)]
pub struct NoticeFeedResponse {
    /// Offset to pass as `after` next time
    pub next: usize,

    /// Entries after `after` that were dropped before this request
    pub missed: usize,

    pub notices: Vec<NoticeView>,
}

/// A notice with its display text.
#[derive(Debug, Serialize)]
pub struct NoticeView {
    #[serde(flatten)]
    pub notice: Notice,

    /// Human-readable message
    pub message: String,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self {
            message: notice.to_string(),
            notice,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
