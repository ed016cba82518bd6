//! Collaborators the planner talks to.
//!
//! The planner never draws anything or reads form fields itself. It asks
//! an [`InputProvider`] for user-entered values, tells a [`Renderer`] what
//! changed on screen, and raises user-facing [`Notice`]s through a
//! [`Notifier`]. None of these are ever read back.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{RoutePath, StopKey};

/// Receives every visual side effect of an itinerary edit.
pub trait Renderer: Send + Sync {
    fn place_marker(&self, stop: StopKey, label: &str);
    fn update_marker_label(&self, stop: StopKey, label: &str);
    fn remove_marker(&self, stop: StopKey);
    fn draw_segment(&self, stop: StopKey, path: &RoutePath);
    fn clear_segment(&self, stop: StopKey);
    fn render_time_display(&self, stop: StopKey, start: &str, end: &str);
    /// Stay length and the travel time to the next stop (`None` when the
    /// stop is last or its lookup failed).
    fn render_duration_and_travel_display(
        &self,
        stop: StopKey,
        duration: &str,
        travel: Option<&str>,
    );
    fn remove_time_display(&self, stop: StopKey);
}

/// One renderer call, in a form that can be stored or sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    PlaceMarker {
        stop: StopKey,
        label: String,
    },
    UpdateMarkerLabel {
        stop: StopKey,
        label: String,
    },
    RemoveMarker {
        stop: StopKey,
    },
    DrawSegment {
        stop: StopKey,
        path: RoutePath,
    },
    ClearSegment {
        stop: StopKey,
    },
    RenderTimeDisplay {
        stop: StopKey,
        start: String,
        end: String,
    },
    RenderDurationAndTravel {
        stop: StopKey,
        duration: String,
        travel: Option<String>,
    },
    RemoveTimeDisplay {
        stop: StopKey,
    },
}

/// Renderer that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn place_marker(&self, _stop: StopKey, _label: &str) {}
    fn update_marker_label(&self, _stop: StopKey, _label: &str) {}
    fn remove_marker(&self, _stop: StopKey) {}
    fn draw_segment(&self, _stop: StopKey, _path: &RoutePath) {}
    fn clear_segment(&self, _stop: StopKey) {}
    fn render_time_display(&self, _stop: StopKey, _start: &str, _end: &str) {}
    fn render_duration_and_travel_display(
        &self,
        _stop: StopKey,
        _duration: &str,
        _travel: Option<&str>,
    ) {
    }
    fn remove_time_display(&self, _stop: StopKey) {}
}

/// How many entries a recording feed keeps before dropping the oldest.
pub const DEFAULT_FEED_CAPACITY: usize = 4096;

/// Entries after an offset into a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    pub entries: Vec<T>,

    /// Offset to ask from next time
    pub next: usize,

    /// Entries after the offset that were dropped before they were read
    pub missed: usize,
}

/// Bounded log of entries, readable from an offset.
///
/// Offsets count every entry ever pushed, so they stay valid after old
/// entries are dropped. Shared by the recording renderer and notifier so a
/// client can poll for everything after the last entry it saw.
#[derive(Debug)]
struct Feed<T> {
    inner: Mutex<FeedInner<T>>,
}

#[derive(Debug)]
struct FeedInner<T> {
    entries: VecDeque<T>,
    /// Offset of `entries[0]`
    base: usize,
    capacity: usize,
}

impl<T: Clone> Feed<T> {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(FeedInner {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_FEED_CAPACITY)),
                base: 0,
                capacity,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedInner<T>> {
        // A panic while pushing cannot leave the deque half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, entry: T) {
        let mut feed = self.lock();
        if feed.entries.len() == feed.capacity {
            feed.entries.pop_front();
            feed.base += 1;
        }
        feed.entries.push_back(entry);
    }

    fn page(&self, after: usize) -> FeedPage<T> {
        let feed = self.lock();
        let entries = feed
            .entries
            .iter()
            .skip(after.saturating_sub(feed.base))
            .cloned()
            .collect();
        FeedPage {
            entries,
            next: feed.base + feed.entries.len(),
            missed: feed.base.saturating_sub(after),
        }
    }

    fn since(&self, offset: usize) -> Vec<T> {
        self.page(offset).entries
    }

    fn len(&self) -> usize {
        let feed = self.lock();
        feed.base + feed.entries.len()
    }

    fn take(&self) -> Vec<T> {
        let mut feed = self.lock();
        feed.base += feed.entries.len();
        feed.entries.drain(..).collect()
    }
}

/// Renderer that records every call as a [`RenderCommand`].
#[derive(Debug)]
pub struct RecordingRenderer {
    feed: Feed<RenderCommand>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Keep at most `capacity` commands, dropping the oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            feed: Feed::with_capacity(capacity),
        }
    }

    /// Commands recorded after the first `offset` that are still kept.
    pub fn commands_since(&self, offset: usize) -> Vec<RenderCommand> {
        self.feed.since(offset)
    }

    pub fn page(&self, after: usize) -> FeedPage<RenderCommand> {
        self.feed.page(after)
    }

    pub fn commands(&self) -> Vec<RenderCommand> {
        self.feed.since(0)
    }

    /// Number of commands recorded so far, dropped ones included.
    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<RenderCommand> {
        self.feed.take()
    }
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for RecordingRenderer {
    fn place_marker(&self, stop: StopKey, label: &str) {
        self.feed.push(RenderCommand::PlaceMarker {
            stop,
            label: label.to_string(),
        });
    }

    fn update_marker_label(&self, stop: StopKey, label: &str) {
        self.feed.push(RenderCommand::UpdateMarkerLabel {
            stop,
            label: label.to_string(),
        });
    }

    fn remove_marker(&self, stop: StopKey) {
        self.feed.push(RenderCommand::RemoveMarker { stop });
    }

    fn draw_segment(&self, stop: StopKey, path: &RoutePath) {
        self.feed.push(RenderCommand::DrawSegment {
            stop,
            path: path.clone(),
        });
    }

    fn clear_segment(&self, stop: StopKey) {
        self.feed.push(RenderCommand::ClearSegment { stop });
    }

    fn render_time_display(&self, stop: StopKey, start: &str, end: &str) {
        self.feed.push(RenderCommand::RenderTimeDisplay {
            stop,
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    fn render_duration_and_travel_display(
        &self,
        stop: StopKey,
        duration: &str,
        travel: Option<&str>,
    ) {
        self.feed.push(RenderCommand::RenderDurationAndTravel {
            stop,
            duration: duration.to_string(),
            travel: travel.map(str::to_string),
        });
    }

    fn remove_time_display(&self, stop: StopKey) {
        self.feed.push(RenderCommand::RemoveTimeDisplay { stop });
    }
}

/// A user-facing message about something that did not go as asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    CannotRemoveAnchor,
    StopNotFound { id: usize },
    InvalidPosition { id: usize },
    RouteLookupFailed {
        from: String,
        to: String,
        reason: String,
    },
    InvalidInput { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CannotRemoveAnchor => write!(f, "the starting point cannot be removed"),
            Notice::StopNotFound { id } => write!(f, "there is no stop {id}"),
            Notice::InvalidPosition { id } => write!(f, "a stop cannot be placed at position {id}"),
            Notice::RouteLookupFailed { from, to, reason } => {
                write!(f, "route request from {from} to {to} failed: {reason}")
            }
            Notice::InvalidInput { reason } => write!(f, "{reason}"),
        }
    }
}

/// One-way channel for [`Notice`]s.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Both notifiers get every notice.
impl<A: Notifier, B: Notifier> Notifier for (A, B) {
    fn notify(&self, notice: Notice) {
        self.0.notify(notice.clone());
        self.1.notify(notice);
    }
}

/// Notifier that logs notices at `warn` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        warn!(%notice, "user notice");
    }
}

/// Notifier that records every notice.
#[derive(Debug)]
pub struct RecordingNotifier {
    feed: Feed<Notice>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            feed: Feed::with_capacity(capacity),
        }
    }

    pub fn notices_since(&self, offset: usize) -> Vec<Notice> {
        self.feed.since(offset)
    }

    pub fn page(&self, after: usize) -> FeedPage<Notice> {
        self.feed.page(after)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.feed.since(0)
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.feed.push(notice);
    }
}

/// Source of the values a user types when adding a stop.
///
/// Only the start time is read for the first stop and only the duration
/// for every later one.
pub trait InputProvider: Send + Sync {
    /// Departure time as `HH:MM`.
    fn start_time(&self) -> String;
    /// Stay as (hours, minutes) text.
    fn duration(&self) -> (String, String);
}

/// Plain form values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub duration_hours: String,
    #[serde(default)]
    pub duration_minutes: String,
}

impl FormInput {
    /// Input for the starting point.
    pub fn start(time: impl Into<String>) -> Self {
        Self {
            start_time: time.into(),
            ..Self::default()
        }
    }

    /// Input for a later stop.
    pub fn stay(hours: impl Into<String>, minutes: impl Into<String>) -> Self {
        Self {
            duration_hours: hours.into(),
            duration_minutes: minutes.into(),
            ..Self::default()
        }
    }
}

impl InputProvider for FormInput {
    fn start_time(&self) -> String {
        self.start_time.clone()
    }

    fn duration(&self) -> (String, String) {
        (self.duration_hours.clone(), self.duration_minutes.clone())
    }
}
