//! The recalculation engine.
//!
//! Every edit runs in the same shape: ask the route lookup for the
//! segments the edit will create, then change the list, store the answers
//! and refresh times downstream until nothing moves. Nothing is written
//! until every lookup has finished, so an edit whose future is dropped
//! leaves no trace. Edits are serialised by a single-flight gate, so the
//! list seen after the lookups is the list they were planned against.

use std::sync::Arc;

use futures::future::{join, join_all};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::{
    DomainError, Location, ScheduleInput, StayDuration, Stop, StopKey, TimeError, TimeValue,
};
use crate::itinerary::{Itinerary, ItineraryError, SegmentRequest, SegmentUpdate};
use crate::routing::{RouteError, RouteEstimate, RouteLookup};

use super::collab::{InputProvider, Notice, Notifier, Renderer};
use super::config::PlannerConfig;

/// Error from a planner operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    /// The edit was rejected; nothing changed
    #[error(transparent)]
    Itinerary(#[from] ItineraryError),

    /// User-entered text could not be parsed; nothing changed
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TimeError),

    /// A stop's times cannot be changed this way
    #[error(transparent)]
    Schedule(#[from] DomainError),
}

/// Owns the itinerary and keeps its times consistent.
pub struct Planner<L> {
    lookup: L,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    config: PlannerConfig,
    itinerary: RwLock<Itinerary>,
    gate: Mutex<()>,
}

impl<L: RouteLookup> Planner<L> {
    /// Create a planner with an empty itinerary.
    pub fn new(
        lookup: L,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<dyn Notifier>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            lookup,
            renderer,
            notifier,
            config,
            itinerary: RwLock::new(Itinerary::new()),
            gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn route_lookup(&self) -> &L {
        &self.lookup
    }

    /// A copy of the itinerary as of the last finished edit.
    pub async fn snapshot(&self) -> Itinerary {
        self.itinerary.read().await.clone()
    }

    /// Add a stop at the end of the day.
    ///
    /// The first stop takes its departure from `input`; every later one
    /// takes its stay. A failed lookup for the new segment leaves the
    /// previous tail without a travel time and the new stop starting when
    /// the previous one ends.
    ///
    /// The lookup runs before anything changes, so dropping the returned
    /// future leaves the itinerary as it was.
    pub async fn append_stop<I: InputProvider>(
        &self,
        name: impl Into<String>,
        location: Location,
        input: &I,
    ) -> Result<StopKey, PlannerError> {
        let _turn = self.gate.lock().await;

        let tail = self.itinerary.read().await.tail().map(Stop::location);
        let schedule = self.read_schedule_input(tail.is_none(), input)?;

        let result = match tail {
            Some(from) => Some(self.estimate(from, location).await),
            None => None,
        };

        let mut itinerary = self.itinerary.write().await;
        let key = itinerary.append(name, location);
        let id = itinerary.len();
        info!(stop = %key, %location, "appended stop");

        if let Some(result) = result {
            self.store_segment(&mut itinerary, id - 1, result);
        }

        let (prev, stop) = itinerary.with_predecessor_mut(id)?;
        stop.set_initial_times(prev, schedule)?;

        self.renderer.place_marker(key, &id.to_string());
        self.render_times(stop);
        self.render_stay(stop);
        Ok(key)
    }

    /// Remove the stop with this id and pull the rest of the day forward.
    ///
    /// The starting point cannot be removed. The stops on either side of
    /// the gap become neighbours; their segment is looked up before the
    /// stop is detached.
    pub async fn remove_stop(&self, id: usize) -> Result<Stop, PlannerError> {
        let _turn = self.gate.lock().await;

        let gap = {
            let itinerary = self.itinerary.read().await;
            match itinerary.stop_at(id) {
                Ok(stop) if stop.is_anchor() => {
                    return Err(self.reject(ItineraryError::AnchorRemoval));
                }
                Ok(_) => {}
                Err(e) => return Err(self.reject(e)),
            }
            let prev = itinerary.stop_at(id - 1)?.location();
            itinerary.stop_at(id + 1).ok().map(|next| (prev, next.location()))
        };

        let result = match gap {
            Some((from, to)) => Some(self.estimate(from, to).await),
            None => None,
        };

        let mut itinerary = self.itinerary.write().await;
        let target = itinerary.stop_at(id)?.key();
        let prev = itinerary.stop_at(id - 1)?.key();

        self.renderer.remove_marker(target);
        self.renderer.remove_time_display(target);
        self.renderer.clear_segment(target);
        self.renderer.clear_segment(prev);

        let removed = itinerary.remove(id, |stop| self.relabel(stop))?;
        info!(stop = %removed.key(), name = removed.name(), "removed stop");

        match result {
            Some(result) => {
                self.store_segment(&mut itinerary, id - 1, result);
                if let Some(next) = itinerary.stop_at(id).ok().map(Stop::key) {
                    self.cascade(&mut itinerary, next);
                }
            }
            None => {
                if let Some(new_tail) = itinerary.get(prev) {
                    self.render_stay(new_tail);
                }
            }
        }
        Ok(removed)
    }

    /// Put a new stop in at this id, shifting later stops back by one.
    ///
    /// Both new segments are looked up concurrently before the stop goes
    /// in.
    pub async fn insert_stop<I: InputProvider>(
        &self,
        id: usize,
        name: impl Into<String>,
        location: Location,
        input: &I,
    ) -> Result<StopKey, PlannerError> {
        let _turn = self.gate.lock().await;

        let (prev, next) = {
            let itinerary = self.itinerary.read().await;
            if id < 2 || id > itinerary.len() + 1 {
                return Err(self.reject(ItineraryError::InvalidPosition(id)));
            }
            let prev = itinerary.stop_at(id - 1)?.location();
            (prev, itinerary.stop_at(id).ok().map(Stop::location))
        };
        let schedule = self.read_schedule_input(false, input)?;

        let (incoming, outgoing) = join(self.estimate(prev, location), async {
            match next {
                Some(to) => Some(self.estimate(location, to).await),
                None => None,
            }
        })
        .await;

        let mut itinerary = self.itinerary.write().await;
        let prev_key = itinerary.stop_at(id - 1)?.key();
        self.renderer.clear_segment(prev_key);

        let key = itinerary.insert(id, name, location, |stop| self.relabel(stop))?;
        info!(stop = %key, id, %location, "inserted stop");

        self.store_segment(&mut itinerary, id - 1, incoming);
        if let Some(outgoing) = outgoing {
            self.store_segment(&mut itinerary, id, outgoing);
        }

        let (prev, stop) = itinerary.with_predecessor_mut(id)?;
        stop.set_initial_times(prev, schedule)?;

        self.renderer.place_marker(key, &id.to_string());
        self.render_times(stop);
        self.render_stay(stop);

        if let Some(next) = itinerary.stop_at(id + 1).ok().map(Stop::key) {
            self.cascade(&mut itinerary, next);
        }
        Ok(key)
    }

    /// Change how long the traveller stays at a stop.
    pub async fn update_duration(
        &self,
        id: usize,
        hours: &str,
        minutes: &str,
    ) -> Result<(), PlannerError> {
        let _turn = self.gate.lock().await;

        let duration = StayDuration::parse(hours, minutes).map_err(|e| self.reject_input(e))?;

        let mut itinerary = self.itinerary.write().await;
        let stop = itinerary.stop_at_mut(id).map_err(|e| self.reject(e))?;
        if stop.is_anchor() {
            self.notifier.notify(Notice::InvalidInput {
                reason: DomainError::AnchorDuration.to_string(),
            });
            return Err(DomainError::AnchorDuration.into());
        }

        stop.set_duration(duration)?;
        let key = stop.key();
        self.render_times(stop);
        self.render_stay(stop);
        debug!(stop = %key, duration = %stop.duration(), "updated stay");

        if let Some(next) = itinerary.stop_at(id + 1).ok().map(Stop::key) {
            self.cascade(&mut itinerary, next);
        }
        Ok(())
    }

    /// Move the departure time of the starting point.
    pub async fn update_start_time(&self, text: &str) -> Result<(), PlannerError> {
        let _turn = self.gate.lock().await;

        let start = TimeValue::parse_clock(text).map_err(|e| self.reject_input(e))?;

        let mut itinerary = self.itinerary.write().await;
        let anchor = itinerary.stop_at_mut(1).map_err(|e| self.reject(e))?;
        anchor.set_anchor_start(start)?;
        self.render_times(anchor);
        debug!(start = %text, "moved departure");

        if let Some(next) = itinerary.stop_at(2).ok().map(Stop::key) {
            self.cascade(&mut itinerary, next);
        }
        Ok(())
    }

    /// Ask again for every segment whose lookup failed.
    ///
    /// Requests go out in batches of `retry_batch_size`. Returns how many
    /// segments now have a travel time.
    pub async fn retry_degraded(&self) -> usize {
        let _turn = self.gate.lock().await;

        let requests = self.itinerary.read().await.degraded_segments();
        if requests.is_empty() {
            return 0;
        }
        debug!(count = requests.len(), "retrying degraded segments");

        let mut results = Vec::with_capacity(requests.len());
        for batch in requests.chunks(self.config.retry_batch_size.max(1)) {
            let futures: Vec<_> = batch
                .iter()
                .map(|request| async move {
                    (*request, self.estimate(request.from, request.to).await)
                })
                .collect();
            results.extend(join_all(futures).await);
        }

        let mut itinerary = self.itinerary.write().await;
        let mut repaired = 0;
        for (request, result) in results {
            if self.apply_estimate(&mut itinerary, &request, result) == SegmentUpdate::Applied {
                repaired += 1;
                self.cascade(&mut itinerary, request.destination);
            }
        }

        info!(repaired, "retried degraded segments");
        repaired
    }

    /// Read what the new stop needs from the input and parse it.
    fn read_schedule_input<I: InputProvider>(
        &self,
        first: bool,
        input: &I,
    ) -> Result<ScheduleInput, PlannerError> {
        let parsed = if first {
            TimeValue::parse_clock(&input.start_time()).map(|start| ScheduleInput::Anchor { start })
        } else {
            let (hours, minutes) = input.duration();
            StayDuration::parse(&hours, &minutes).map(|duration| ScheduleInput::Visit { duration })
        };
        parsed.map_err(|e| self.reject_input(e))
    }

    /// One lookup, bounded by the configured timeout.
    async fn estimate(&self, from: Location, to: Location) -> Result<RouteEstimate, RouteError> {
        debug!(%from, %to, "requesting route");
        let timeout = self.config.lookup_timeout;
        match tokio::time::timeout(timeout, self.lookup.lookup(from, to)).await {
            Ok(result) => result,
            Err(_) => Err(RouteError::Timeout(timeout)),
        }
    }

    /// Store the result for the segment leaving stop `origin`.
    fn store_segment(
        &self,
        itinerary: &mut Itinerary,
        origin: usize,
        result: Result<RouteEstimate, RouteError>,
    ) {
        if let Some(request) = itinerary.segment_request(origin) {
            self.apply_estimate(itinerary, &request, result);
        }
    }

    /// Store a finished lookup and redraw the segment it belongs to.
    fn apply_estimate(
        &self,
        itinerary: &mut Itinerary,
        request: &SegmentRequest,
        result: Result<RouteEstimate, RouteError>,
    ) -> SegmentUpdate {
        let (estimate, failure) = match result {
            Ok(estimate) => (
                Some((TimeValue::from_travel(estimate.travel), estimate.path)),
                None,
            ),
            Err(e) => (None, Some(e)),
        };

        let update = itinerary.apply_segment(request, estimate);
        if update == SegmentUpdate::Stale {
            debug!(
                origin = %request.origin,
                destination = %request.destination,
                "discarding route for stops that are no longer neighbours"
            );
            return update;
        }

        if let Some(origin) = itinerary.get(request.origin) {
            match origin.route_to_next() {
                Some(path) => self.renderer.draw_segment(origin.key(), path),
                None => self.renderer.clear_segment(origin.key()),
            }
            self.render_stay(origin);
        }

        if let Some(e) = failure {
            let name = |key| {
                itinerary
                    .get(key)
                    .map(|s: &Stop| s.name().to_string())
                    .unwrap_or_default()
            };
            warn!(
                origin = %request.origin,
                destination = %request.destination,
                error = %e,
                "route lookup failed"
            );
            self.notifier.notify(Notice::RouteLookupFailed {
                from: name(request.origin),
                to: name(request.destination),
                reason: e.to_string(),
            });
        }

        update
    }

    /// Refresh times from `first` onwards and redraw whatever moved.
    fn cascade(&self, itinerary: &mut Itinerary, first: StopKey) {
        let Some(id) = itinerary.id_of(first) else {
            return;
        };
        let changed = itinerary.cascade_from(id);
        debug!(from = id, changed = changed.len(), "cascaded times");

        for key in changed {
            if let Some(stop) = itinerary.get(key) {
                self.render_times(stop);
            }
        }
    }

    fn relabel(&self, stop: &Stop) {
        self.renderer
            .update_marker_label(stop.key(), &stop.id().to_string());
    }

    fn render_times(&self, stop: &Stop) {
        if let (Some(start), Some(end)) = (stop.start_time(), stop.end_time()) {
            self.renderer
                .render_time_display(stop.key(), start.text(), end.text());
        }
    }

    fn render_stay(&self, stop: &Stop) {
        self.renderer.render_duration_and_travel_display(
            stop.key(),
            stop.duration().text(),
            stop.travel_to_next().map(TimeValue::text),
        );
    }

    /// Report a rejected edit to the user.
    fn reject(&self, err: ItineraryError) -> PlannerError {
        let notice = match err {
            ItineraryError::NotFound(id) => Notice::StopNotFound { id },
            ItineraryError::AnchorRemoval => Notice::CannotRemoveAnchor,
            ItineraryError::InvalidPosition(id) => Notice::InvalidPosition { id },
        };
        info!(%notice, "rejected edit");
        self.notifier.notify(notice);
        err.into()
    }

    fn reject_input(&self, err: TimeError) -> PlannerError {
        self.notifier.notify(Notice::InvalidInput {
            reason: err.to_string(),
        });
        err.into()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
