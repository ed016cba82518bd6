//! Mock route lookup for testing without a routing server.
//!
//! Answers come from a table of (origin, destination) pairs. Each pair can
//! succeed with a fixed travel time, fail, or never answer.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;

use crate::domain::{Location, LocationKey, RoutePath};

use super::error::RouteError;
use super::{RouteEstimate, RouteLookup};

#[derive(Debug, Clone, Copy)]
enum MockAnswer {
    Minutes(i64),
    Fail,
    Hang,
}

/// Mock route lookup that serves answers from a table.
///
/// Pairs without an entry use the default answer, which is a failure
/// unless [`with_default_minutes`](Self::with_default_minutes) is set.
#[derive(Debug, Clone)]
pub struct MockRouteLookup {
    answers: HashMap<(LocationKey, LocationKey), MockAnswer>,
    default: MockAnswer,
    calls: Arc<AtomicUsize>,
}

impl MockRouteLookup {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            default: MockAnswer::Fail,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `from → to` with a straight path and this travel time.
    pub fn with_route(mut self, from: Location, to: Location, minutes: i64) -> Self {
        self.answers
            .insert((from.key(), to.key()), MockAnswer::Minutes(minutes));
        self
    }

    /// Fail every lookup for `from → to`.
    pub fn with_failure(mut self, from: Location, to: Location) -> Self {
        self.answers.insert((from.key(), to.key()), MockAnswer::Fail);
        self
    }

    /// Never answer lookups for `from → to`.
    pub fn with_hang(mut self, from: Location, to: Location) -> Self {
        self.answers.insert((from.key(), to.key()), MockAnswer::Hang);
        self
    }

    /// Answer unknown pairs with this travel time instead of failing.
    pub fn with_default_minutes(mut self, minutes: i64) -> Self {
        self.default = MockAnswer::Minutes(minutes);
        self
    }

    /// Number of lookups made so far, shared between clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockRouteLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteLookup for MockRouteLookup {
    async fn lookup(&self, from: Location, to: Location) -> Result<RouteEstimate, RouteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = self
            .answers
            .get(&(from.key(), to.key()))
            .copied()
            .unwrap_or(self.default);

        match answer {
            MockAnswer::Minutes(minutes) => Ok(RouteEstimate {
                path: RoutePath::straight(from, to),
                travel: Duration::minutes(minutes),
            }),
            MockAnswer::Fail => Err(RouteError::NoRoute(format!("no mock route {from} -> {to}"))),
            MockAnswer::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64) -> Location {
        Location::new(lat, 0.0).unwrap()
    }

    #[tokio::test]
    async fn known_pair_answers() {
        let mock = MockRouteLookup::new().with_route(loc(1.0), loc(2.0), 15);
        let estimate = mock.lookup(loc(1.0), loc(2.0)).await.unwrap();
        assert_eq!(estimate.travel, Duration::minutes(15));
        assert_eq!(estimate.path.points(), &[loc(1.0), loc(2.0)]);
    }

    #[tokio::test]
    async fn unknown_pair_fails_by_default() {
        let mock = MockRouteLookup::new();
        assert!(matches!(
            mock.lookup(loc(1.0), loc(2.0)).await,
            Err(RouteError::NoRoute(_))
        ));
    }

    #[tokio::test]
    async fn default_minutes_for_unknown_pairs() {
        let mock = MockRouteLookup::new()
            .with_default_minutes(5)
            .with_failure(loc(3.0), loc(4.0));
        assert!(mock.lookup(loc(1.0), loc(2.0)).await.is_ok());
        assert!(mock.lookup(loc(3.0), loc(4.0)).await.is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hang_never_answers() {
        let mock = MockRouteLookup::new().with_hang(loc(1.0), loc(2.0));
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(60),
            mock.lookup(loc(1.0), loc(2.0)),
        )
        .await;
        assert!(result.is_err());
    }
}
