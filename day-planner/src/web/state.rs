//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::{
    DEFAULT_FEED_CAPACITY, Planner, PlannerConfig, RecordingNotifier, RecordingRenderer,
    TracingNotifier,
};
use crate::routing::RouteLookup;

/// Shared application state.
///
/// Holds the planner and the two feeds clients poll for what the planner
/// drew and what it wanted the user to know.
pub struct AppState<L> {
    /// The day being planned
    pub planner: Arc<Planner<L>>,

    /// Recent render commands, in order
    pub renderer: Arc<RecordingRenderer>,

    /// Recent user notices, in order
    pub notifier: Arc<RecordingNotifier>,
}

impl<L: RouteLookup> AppState<L> {
    /// Create a new app state around an empty itinerary.
    pub fn new(lookup: L, config: PlannerConfig) -> Self {
        Self::with_feed_capacity(lookup, config, DEFAULT_FEED_CAPACITY)
    }

    /// Like [`AppState::new`], keeping at most `capacity` entries per feed.
    pub fn with_feed_capacity(lookup: L, config: PlannerConfig, capacity: usize) -> Self {
        let renderer = Arc::new(RecordingRenderer::with_capacity(capacity));
        let notifier = Arc::new(RecordingNotifier::with_capacity(capacity));
        let planner = Planner::new(
            lookup,
            renderer.clone(),
            Arc::new((TracingNotifier, notifier.clone())),
            config,
        );

        Self {
            planner: Arc::new(planner),
            renderer,
            notifier,
        }
    }
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            renderer: Arc::clone(&self.renderer),
            notifier: Arc::clone(&self.notifier),
        }
    }
}
