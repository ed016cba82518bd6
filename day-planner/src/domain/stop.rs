//! A single entry on the day plan.
//!
//! A stop's `id` is its 1-based position and changes whenever the plan is
//! edited. Its [`StopKey`] never changes and is what collaborators and
//! in-flight route lookups hold on to.

use std::fmt;

use serde::Serialize;

use super::error::DomainError;
use super::location::{Location, RoutePath};
use super::time::{StayDuration, TimeValue, add_times};

/// Stable identity of a stop within one itinerary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StopKey(u64);

impl StopKey {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopKey({})", self.0)
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop-{}", self.0)
    }
}

/// User input consumed when a stop's times are first set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleInput {
    /// The starting point: only a departure time.
    Anchor { start: TimeValue },
    /// Any later stop: only how long the traveller stays.
    Visit { duration: StayDuration },
}

/// A stop on the day plan.
///
/// Time fields are `None` only between the structural append and the
/// moment [`set_initial_times`](Stop::set_initial_times) runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    key: StopKey,
    id: usize,
    name: String,
    location: Location,
    start_time: Option<TimeValue>,
    end_time: Option<TimeValue>,
    duration: TimeValue,
    travel_to_next: Option<TimeValue>,
    route_to_next: Option<RoutePath>,
}

impl Stop {
    pub(crate) fn new(key: StopKey, id: usize, name: String, location: Location) -> Self {
        Self {
            key,
            id,
            name,
            location,
            start_time: None,
            end_time: None,
            duration: TimeValue::span(0),
            travel_to_next: None,
            route_to_next: None,
        }
    }

    pub fn key(&self) -> StopKey {
        self.key
    }

    /// 1-based position in the itinerary.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn start_time(&self) -> Option<&TimeValue> {
        self.start_time.as_ref()
    }

    pub fn end_time(&self) -> Option<&TimeValue> {
        self.end_time.as_ref()
    }

    pub fn duration(&self) -> &TimeValue {
        &self.duration
    }

    pub fn travel_to_next(&self) -> Option<&TimeValue> {
        self.travel_to_next.as_ref()
    }

    pub fn route_to_next(&self) -> Option<&RoutePath> {
        self.route_to_next.as_ref()
    }

    /// The starting point of the day.
    pub fn is_anchor(&self) -> bool {
        self.id == 1
    }

    /// Whether the initial times have been set.
    pub fn is_scheduled(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    /// First-time initialisation of the time fields.
    ///
    /// The anchor takes its start from the input and keeps a zero stay.
    /// Any other stop takes its stay from the input and derives its start
    /// from `prev`, whose own times must already be final.
    pub fn set_initial_times(
        &mut self,
        prev: Option<&Stop>,
        input: ScheduleInput,
    ) -> Result<(), DomainError> {
        match (self.is_anchor(), input) {
            (true, ScheduleInput::Anchor { start }) => {
                self.duration = TimeValue::span(0);
                self.end_time = Some(start.clone());
                self.start_time = Some(start);
                Ok(())
            }
            (false, ScheduleInput::Visit { duration }) => {
                let prev = prev.ok_or(DomainError::MissingPredecessor(self.id))?;
                self.duration = duration.to_time_value();
                self.refresh_start_time(prev);
                self.refresh_end_time();
                Ok(())
            }
            _ => Err(DomainError::InputMismatch(self.id)),
        }
    }

    /// Move the anchor's departure. Start and end stay equal.
    pub fn set_anchor_start(&mut self, start: TimeValue) -> Result<(), DomainError> {
        if !self.is_anchor() {
            return Err(DomainError::InputMismatch(self.id));
        }
        self.end_time = Some(start.clone());
        self.start_time = Some(start);
        Ok(())
    }

    /// Change how long the traveller stays. End time is refreshed.
    pub fn set_duration(&mut self, duration: StayDuration) -> Result<(), DomainError> {
        if self.is_anchor() {
            return Err(DomainError::AnchorDuration);
        }
        self.duration = duration.to_time_value();
        self.refresh_end_time();
        Ok(())
    }

    /// Recompute the start from the predecessor's end plus its travel time.
    ///
    /// An unknown travel time (failed lookup) counts as zero minutes. Does
    /// nothing if the predecessor has no end time yet. Returns whether the
    /// start changed.
    pub fn refresh_start_time(&mut self, prev: &Stop) -> bool {
        let Some(prev_end) = prev.end_time() else {
            return false;
        };
        let start = match prev.travel_to_next() {
            Some(travel) => add_times(prev_end, travel),
            None => prev_end.clone(),
        };
        if self.start_time.as_ref() == Some(&start) {
            return false;
        }
        self.start_time = Some(start);
        true
    }

    /// Recompute the end from the start plus the stay. Returns whether the
    /// end changed.
    pub fn refresh_end_time(&mut self) -> bool {
        let Some(start) = self.start_time() else {
            return false;
        };
        let end = add_times(start, &self.duration);
        if self.end_time.as_ref() == Some(&end) {
            return false;
        }
        self.end_time = Some(end);
        true
    }

    /// Store the segment to the successor. Travel and path are always
    /// written together.
    pub(crate) fn set_segment(&mut self, travel: TimeValue, path: RoutePath) {
        self.travel_to_next = Some(travel);
        self.route_to_next = Some(path);
    }

    /// Forget the segment to the successor.
    pub(crate) fn clear_segment(&mut self) {
        self.travel_to_next = None;
        self.route_to_next = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new(25.0, 121.5).unwrap()
    }

    fn anchor_at(text: &str) -> Stop {
        let mut stop = Stop::new(StopKey::new(0), 1, "Origin".into(), loc());
        stop.set_initial_times(
            None,
            ScheduleInput::Anchor {
                start: TimeValue::parse_clock(text).unwrap(),
            },
        )
        .unwrap();
        stop
    }

    fn visit(hours: u32, minutes: u32) -> ScheduleInput {
        ScheduleInput::Visit {
            duration: StayDuration::new(hours, minutes).unwrap(),
        }
    }

    #[test]
    fn anchor_start_equals_end() {
        let anchor = anchor_at("09:00");
        assert_eq!(anchor.start_time().unwrap().text(), "09:00");
        assert_eq!(anchor.end_time(), anchor.start_time());
        assert_eq!(anchor.duration().value(), 0);
    }

    #[test]
    fn visit_derives_start_from_predecessor() {
        let mut origin = anchor_at("09:00");
        origin.set_segment(TimeValue::span(20), RoutePath::default());

        let mut museum = Stop::new(StopKey::new(1), 2, "Museum".into(), loc());
        museum.set_initial_times(Some(&origin), visit(1, 30)).unwrap();

        assert_eq!(museum.start_time().unwrap().text(), "09:20");
        assert_eq!(museum.end_time().unwrap().text(), "10:50");
        assert_eq!(museum.duration().text(), "1h 30m");
    }

    #[test]
    fn unknown_travel_counts_as_zero() {
        let origin = anchor_at("09:00");
        let mut next = Stop::new(StopKey::new(1), 2, "Next".into(), loc());
        next.set_initial_times(Some(&origin), visit(0, 45)).unwrap();

        assert_eq!(next.start_time().unwrap().text(), "09:00");
        assert_eq!(next.end_time().unwrap().text(), "09:45");
    }

    #[test]
    fn visit_without_predecessor_is_rejected() {
        let mut stop = Stop::new(StopKey::new(1), 2, "Lost".into(), loc());
        let err = stop.set_initial_times(None, visit(1, 0)).unwrap_err();
        assert_eq!(err, DomainError::MissingPredecessor(2));
        assert!(!stop.is_scheduled());
    }

    #[test]
    fn mismatched_input_is_rejected() {
        let mut anchor = Stop::new(StopKey::new(0), 1, "Origin".into(), loc());
        assert_eq!(
            anchor.set_initial_times(None, visit(1, 0)),
            Err(DomainError::InputMismatch(1))
        );

        let origin = anchor_at("09:00");
        let mut stop = Stop::new(StopKey::new(1), 2, "Museum".into(), loc());
        let input = ScheduleInput::Anchor {
            start: TimeValue::clock(600),
        };
        assert_eq!(
            stop.set_initial_times(Some(&origin), input),
            Err(DomainError::InputMismatch(2))
        );
    }

    #[test]
    fn refresh_reports_changes() {
        let mut origin = anchor_at("09:00");
        origin.set_segment(TimeValue::span(20), RoutePath::default());
        let mut museum = Stop::new(StopKey::new(1), 2, "Museum".into(), loc());
        museum.set_initial_times(Some(&origin), visit(1, 0)).unwrap();

        assert!(!museum.refresh_start_time(&origin));
        assert!(!museum.refresh_end_time());

        origin.set_segment(TimeValue::span(35), RoutePath::default());
        assert!(museum.refresh_start_time(&origin));
        assert!(museum.refresh_end_time());
        assert_eq!(museum.start_time().unwrap().text(), "09:35");
        assert_eq!(museum.end_time().unwrap().text(), "10:35");
    }

    #[test]
    fn refresh_without_predecessor_end_is_noop() {
        let pending = Stop::new(StopKey::new(0), 1, "Pending".into(), loc());
        let mut stop = Stop::new(StopKey::new(1), 2, "Museum".into(), loc());
        assert!(!stop.refresh_start_time(&pending));
        assert!(!stop.refresh_end_time());
        assert!(stop.start_time().is_none());
    }

    #[test]
    fn anchor_duration_is_fixed() {
        let mut anchor = anchor_at("09:00");
        assert_eq!(
            anchor.set_duration(StayDuration::new(1, 0).unwrap()),
            Err(DomainError::AnchorDuration)
        );
        assert_eq!(anchor.duration().value(), 0);
    }

    #[test]
    fn segment_fields_move_together() {
        let mut origin = anchor_at("09:00");
        let path = RoutePath::straight(loc(), loc());
        origin.set_segment(TimeValue::span(12), path.clone());
        assert_eq!(origin.travel_to_next().unwrap().value(), 12);
        assert_eq!(origin.route_to_next(), Some(&path));

        origin.clear_segment();
        assert!(origin.travel_to_next().is_none());
        assert!(origin.route_to_next().is_none());
    }

    #[test]
    fn key_display() {
        assert_eq!(StopKey::new(7).to_string(), "stop-7");
        assert_eq!(format!("{:?}", StopKey::new(7)), "StopKey(7)");
    }
}
