//! Domain types for the day planner.
//!
//! This module contains the value types a day plan is built from. All
//! types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod error;
mod location;
mod stop;
mod time;

pub use error::DomainError;
pub use location::{InvalidLocation, Location, LocationKey, RoutePath};
pub use stop::{ScheduleInput, Stop, StopKey};
pub use time::{
    StayDuration, TimeError, TimeFormat, TimeValue, add_times, minutes_rounded,
    time_text_to_value, time_value_to_text,
};
