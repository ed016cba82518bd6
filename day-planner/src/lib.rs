//! Single-day trip planner server.
//!
//! Keeps an ordered list of stops for one day. Each stop knows when the
//! traveller arrives, how long they stay, and how long it takes to reach
//! the next one; adding or removing a stop re-times the rest of the day.

pub mod domain;
pub mod itinerary;
pub mod planner;
pub mod routing;
pub mod web;
