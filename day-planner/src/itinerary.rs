//! The ordered stops of one day.
//!
//! Stops live in a `Vec` addressed by position. Neighbours are found from
//! the position, so removing a stop cannot leave a dangling link. Every
//! structural edit renumbers the ids before it returns, so between calls
//! the ids are always exactly `1..=len` in order.

use crate::domain::{Location, RoutePath, Stop, StopKey, TimeValue, add_times};

/// Errors from structural edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    /// No stop has this id
    #[error("no stop with id {0}")]
    NotFound(usize),

    /// The starting point cannot be removed
    #[error("the starting point cannot be removed")]
    AnchorRemoval,

    /// A stop cannot be inserted at this id
    #[error("cannot insert a stop at position {0}")]
    InvalidPosition(usize),
}

/// A broken itinerary invariant.
///
/// These only arise from a bug in the edit or cascade code, never from
/// user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("stop at position {position} has id {id}")]
    IdMismatch { position: usize, id: usize },

    #[error("the starting point must have zero duration and equal start and end")]
    Anchor,

    #[error("stop {0} has no start or end time")]
    Unscheduled(usize),

    #[error("stop {id} starts at {actual}, expected {expected}")]
    StartMismatch {
        id: usize,
        expected: String,
        actual: String,
    },

    #[error("stop {id} ends at {actual}, expected {expected}")]
    EndMismatch {
        id: usize,
        expected: String,
        actual: String,
    },

    #[error("last stop {0} still has a segment to a successor")]
    TailSegment(usize),

    #[error("stop {0} has a travel time without a route, or a route without a travel time")]
    HalfSegment(usize),
}

/// A route lookup captured at dispatch time.
///
/// Endpoints are held by key, not id, since ids change on every edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRequest {
    pub origin: StopKey,
    pub destination: StopKey,
    pub from: Location,
    pub to: Location,
}

/// What happened when a lookup result came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentUpdate {
    /// Travel time and route stored on the origin stop.
    Applied,
    /// Lookup failed; the origin's segment is cleared.
    Cleared,
    /// The captured endpoints are no longer neighbours; result dropped.
    Stale,
}

/// An ordered, editable list of stops.
#[derive(Debug, Clone, Default)]
pub struct Itinerary {
    stops: Vec<Stop>,
    next_key: u64,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Look up a stop by its current id.
    pub fn stop_at(&self, id: usize) -> Result<&Stop, ItineraryError> {
        id.checked_sub(1)
            .and_then(|idx| self.stops.get(idx))
            .ok_or(ItineraryError::NotFound(id))
    }

    pub(crate) fn stop_at_mut(&mut self, id: usize) -> Result<&mut Stop, ItineraryError> {
        id.checked_sub(1)
            .and_then(|idx| self.stops.get_mut(idx))
            .ok_or(ItineraryError::NotFound(id))
    }

    /// Look up a stop by identity.
    pub fn get(&self, key: StopKey) -> Option<&Stop> {
        self.stops.iter().find(|s| s.key() == key)
    }

    /// Current id of the stop with this key.
    pub fn id_of(&self, key: StopKey) -> Option<usize> {
        self.index_of(key).map(|idx| idx + 1)
    }

    pub fn contains(&self, key: StopKey) -> bool {
        self.index_of(key).is_some()
    }

    fn index_of(&self, key: StopKey) -> Option<usize> {
        self.stops.iter().position(|s| s.key() == key)
    }

    pub fn head(&self) -> Option<&Stop> {
        self.stops.first()
    }

    pub fn tail(&self) -> Option<&Stop> {
        self.stops.last()
    }

    /// In-order iteration from the starting point to the last stop.
    pub fn iter(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }

    /// Visit every stop from head to tail.
    pub fn traverse_all(&self, mut visit: impl FnMut(&Stop)) {
        for stop in &self.stops {
            visit(stop);
        }
    }

    /// Add a stop at the end and return its key.
    ///
    /// The new stop gets `id = len + 1`; no existing id changes. Its times
    /// are left unset for the caller to initialise.
    pub fn append(&mut self, name: impl Into<String>, location: Location) -> StopKey {
        let key = self.allocate_key();
        let id = self.stops.len() + 1;
        self.stops.push(Stop::new(key, id, name.into(), location));
        key
    }

    /// Add a stop so that it gets the given id.
    ///
    /// `id` must be in `2..=len + 1`; nothing goes before the starting
    /// point. The predecessor's segment is cleared since its successor
    /// changed. Stops after the new one are renumbered and reported to
    /// `relabel`.
    pub fn insert(
        &mut self,
        id: usize,
        name: impl Into<String>,
        location: Location,
        relabel: impl FnMut(&Stop),
    ) -> Result<StopKey, ItineraryError> {
        if id < 2 || id > self.stops.len() + 1 {
            return Err(ItineraryError::InvalidPosition(id));
        }

        let key = self.allocate_key();
        let idx = id - 1;
        self.stops.insert(idx, Stop::new(key, id, name.into(), location));
        self.stops[idx - 1].clear_segment();
        self.recalculate_ids(relabel);
        Ok(key)
    }

    /// Detach the stop with this id and close the gap in the ids.
    ///
    /// The predecessor's segment is cleared: either it has a new successor
    /// that still needs a lookup, or it is now the last stop. Stops whose
    /// id changed are reported to `relabel`.
    pub fn remove(
        &mut self,
        id: usize,
        relabel: impl FnMut(&Stop),
    ) -> Result<Stop, ItineraryError> {
        if id == 0 || id > self.stops.len() {
            return Err(ItineraryError::NotFound(id));
        }
        if id == 1 {
            return Err(ItineraryError::AnchorRemoval);
        }

        let removed = self.stops.remove(id - 1);
        self.stops[id - 2].clear_segment();
        self.recalculate_ids(relabel);
        Ok(removed)
    }

    /// Reassign ids `1, 2, 3, …` in list order.
    ///
    /// Each stop whose id changed is passed to `relabel`. Returns how many
    /// changed; a second call in a row always returns 0.
    pub fn recalculate_ids(&mut self, mut relabel: impl FnMut(&Stop)) -> usize {
        let mut changed = 0;
        for (idx, stop) in self.stops.iter_mut().enumerate() {
            let id = idx + 1;
            if stop.id() != id {
                stop.set_id(id);
                relabel(stop);
                changed += 1;
            }
        }
        changed
    }

    /// Capture the segment from the stop with this id to its successor.
    pub fn segment_request(&self, id: usize) -> Option<SegmentRequest> {
        let idx = id.checked_sub(1)?;
        let origin = self.stops.get(idx)?;
        let destination = self.stops.get(idx + 1)?;
        Some(SegmentRequest {
            origin: origin.key(),
            destination: destination.key(),
            from: origin.location(),
            to: destination.location(),
        })
    }

    /// Segments whose travel time is unknown, in list order.
    pub fn degraded_segments(&self) -> Vec<SegmentRequest> {
        self.stops
            .iter()
            .filter(|s| s.travel_to_next().is_none())
            .filter_map(|s| self.segment_request(s.id()))
            .collect()
    }

    /// Apply a finished lookup to the origin stop.
    ///
    /// The result is used only if both captured stops still exist and are
    /// still neighbours; otherwise it belongs to a topology that is gone
    /// and is dropped.
    pub fn apply_segment(
        &mut self,
        request: &SegmentRequest,
        estimate: Option<(TimeValue, RoutePath)>,
    ) -> SegmentUpdate {
        let Some(idx) = self.index_of(request.origin) else {
            return SegmentUpdate::Stale;
        };
        if self.stops.get(idx + 1).map(Stop::key) != Some(request.destination) {
            return SegmentUpdate::Stale;
        }

        let origin = &mut self.stops[idx];
        match estimate {
            Some((travel, path)) => {
                origin.set_segment(travel, path);
                SegmentUpdate::Applied
            }
            None => {
                origin.clear_segment();
                SegmentUpdate::Cleared
            }
        }
    }

    /// Refresh start and end times from the stop with this id onwards.
    ///
    /// Stops are refreshed in order until one comes out unchanged or the
    /// last stop is reached. Returns the keys of the stops whose times
    /// changed.
    pub fn cascade_from(&mut self, id: usize) -> Vec<StopKey> {
        let mut changed = Vec::new();
        let start = id.max(2) - 1;

        for idx in start..self.stops.len() {
            let (before, rest) = self.stops.split_at_mut(idx);
            let prev = &before[idx - 1];
            let stop = &mut rest[0];

            let start_changed = stop.refresh_start_time(prev);
            let end_changed = stop.refresh_end_time();
            if !start_changed && !end_changed {
                break;
            }
            changed.push(stop.key());
        }

        changed
    }

    /// Predecessor and stop with this id, for first-time scheduling.
    pub(crate) fn with_predecessor_mut(
        &mut self,
        id: usize,
    ) -> Result<(Option<&Stop>, &mut Stop), ItineraryError> {
        if id == 0 || id > self.stops.len() {
            return Err(ItineraryError::NotFound(id));
        }
        let (before, rest) = self.stops.split_at_mut(id - 1);
        let before: &[Stop] = before;
        Ok((before.last(), &mut rest[0]))
    }

    /// Check every structural and time invariant.
    ///
    /// A stop after a failed lookup has no travel time; for the time
    /// checks that counts as zero minutes.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (idx, stop) in self.stops.iter().enumerate() {
            if stop.id() != idx + 1 {
                return Err(InvariantViolation::IdMismatch {
                    position: idx + 1,
                    id: stop.id(),
                });
            }
            if stop.travel_to_next().is_some() != stop.route_to_next().is_some() {
                return Err(InvariantViolation::HalfSegment(stop.id()));
            }
        }

        if let Some(tail) = self.tail()
            && (tail.travel_to_next().is_some() || tail.route_to_next().is_some())
        {
            return Err(InvariantViolation::TailSegment(tail.id()));
        }

        let Some(anchor) = self.head() else {
            return Ok(());
        };
        let (Some(start), Some(end)) = (anchor.start_time(), anchor.end_time()) else {
            return Err(InvariantViolation::Unscheduled(anchor.id()));
        };
        if anchor.duration().value() != 0 || start != end {
            return Err(InvariantViolation::Anchor);
        }

        for pair in self.stops.windows(2) {
            let (prev, stop) = (&pair[0], &pair[1]);
            let (Some(prev_end), Some(start), Some(end)) =
                (prev.end_time(), stop.start_time(), stop.end_time())
            else {
                return Err(InvariantViolation::Unscheduled(stop.id()));
            };

            let expected_start = match prev.travel_to_next() {
                Some(travel) => add_times(prev_end, travel),
                None => prev_end.clone(),
            };
            if start != &expected_start {
                return Err(InvariantViolation::StartMismatch {
                    id: stop.id(),
                    expected: expected_start.text().to_string(),
                    actual: start.text().to_string(),
                });
            }

            let expected_end = add_times(start, stop.duration());
            if end != &expected_end {
                return Err(InvariantViolation::EndMismatch {
                    id: stop.id(),
                    expected: expected_end.text().to_string(),
                    actual: end.text().to_string(),
                });
            }
        }

        Ok(())
    }

    fn allocate_key(&mut self) -> StopKey {
        let key = StopKey::new(self.next_key);
        self.next_key += 1;
        key
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{ScheduleInput, StayDuration};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Append { stay: u32, travel: Option<u32> },
        Insert { at: usize, stay: u32 },
        Remove { id: usize },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..240, proptest::option::of(0u32..120))
                .prop_map(|(stay, travel)| Op::Append { stay, travel }),
            (0usize..8, 0u32..240).prop_map(|(at, stay)| Op::Insert { at, stay }),
            (0usize..8).prop_map(|id| Op::Remove { id }),
        ]
    }

    fn visit(minutes: u32) -> ScheduleInput {
        ScheduleInput::Visit {
            duration: StayDuration::new(minutes / 60, minutes % 60).unwrap(),
        }
    }

    fn location(n: usize) -> Location {
        Location::new((n % 90) as f64, 0.0).unwrap()
    }

    /// Drive the itinerary the way the planner does, with a straight-line
    /// "lookup" of `travel` minutes (or a failure for `None`).
    fn apply(itinerary: &mut Itinerary, op: Op, counter: usize) {
        match op {
            Op::Append { stay, travel } => {
                let first = itinerary.is_empty();
                itinerary.append(format!("s{counter}"), location(counter));
                let id = itinerary.len();
                if let Some(request) = itinerary.segment_request(id - 1) {
                    let estimate = travel.map(|t| (TimeValue::span(t), RoutePath::default()));
                    itinerary.apply_segment(&request, estimate);
                }
                let input = if first {
                    ScheduleInput::Anchor {
                        start: TimeValue::clock(480),
                    }
                } else {
                    visit(stay)
                };
                let (prev, stop) = itinerary.with_predecessor_mut(id).unwrap();
                stop.set_initial_times(prev, input).unwrap();
            }
            Op::Insert { at, stay } => {
                if itinerary.is_empty() {
                    return;
                }
                let id = 2 + at % itinerary.len();
                itinerary
                    .insert(id, format!("s{counter}"), location(counter), |_| {})
                    .unwrap();
                for origin in [id - 1, id] {
                    if let Some(request) = itinerary.segment_request(origin) {
                        let estimate = (TimeValue::span(7), RoutePath::default());
                        itinerary.apply_segment(&request, Some(estimate));
                    }
                }
                let (prev, stop) = itinerary.with_predecessor_mut(id).unwrap();
                stop.set_initial_times(prev, visit(stay)).unwrap();
                itinerary.cascade_from(id + 1);
            }
            Op::Remove { id } => {
                let len = itinerary.len();
                match itinerary.remove(id, |_| {}) {
                    Ok(_) => {
                        if let Some(request) = itinerary.segment_request(id - 1) {
                            let estimate = (TimeValue::span(5), RoutePath::default());
                            itinerary.apply_segment(&request, Some(estimate));
                            itinerary.cascade_from(id);
                        }
                    }
                    Err(ItineraryError::AnchorRemoval) => assert_eq!(id, 1),
                    Err(ItineraryError::NotFound(_)) => assert!(id == 0 || id > len),
                    Err(e) => panic!("unexpected error {e}"),
                }
            }
        }
    }

    proptest! {
        /// Ids stay contiguous and every time invariant holds after each edit
        #[test]
        fn invariants_hold_after_every_edit(ops in proptest::collection::vec(op(), 0..30)) {
            let mut itinerary = Itinerary::new();
            for (counter, op) in ops.into_iter().enumerate() {
                apply(&mut itinerary, op, counter);

                let ids: Vec<usize> = itinerary.iter().map(Stop::id).collect();
                let expected: Vec<usize> = (1..=itinerary.len()).collect();
                prop_assert_eq!(ids, expected);
                prop_assert_eq!(itinerary.check_invariants(), Ok(()));
            }
        }

        /// The starting point can never be removed
        #[test]
        fn anchor_survives(ops in proptest::collection::vec(op(), 1..20)) {
            let mut itinerary = Itinerary::new();
            apply(&mut itinerary, Op::Append { stay: 0, travel: None }, 0);
            let anchor = itinerary.head().unwrap().key();
            for (counter, op) in ops.into_iter().enumerate() {
                apply(&mut itinerary, op, counter + 1);
                prop_assert_eq!(itinerary.head().unwrap().key(), anchor);
                let head = itinerary.head().unwrap();
                prop_assert_eq!(head.duration().value(), 0);
                prop_assert_eq!(head.start_time(), head.end_time());
            }
        }

        /// Renumbering twice gives the same ids as renumbering once
        #[test]
        fn renumbering_idempotent(ops in proptest::collection::vec(op(), 0..20)) {
            let mut itinerary = Itinerary::new();
            for (counter, op) in ops.into_iter().enumerate() {
                apply(&mut itinerary, op, counter);
            }
            itinerary.recalculate_ids(|_| {});
            let once: Vec<usize> = itinerary.iter().map(Stop::id).collect();
            prop_assert_eq!(itinerary.recalculate_ids(|_| {}), 0);
            let twice: Vec<usize> = itinerary.iter().map(Stop::id).collect();
            prop_assert_eq!(once, twice);
        }
    }
}
