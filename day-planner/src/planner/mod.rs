//! Keeps a day's stops scheduled while they are added, moved and removed.
//!
//! The [`Planner`] owns the itinerary. Each edit changes the list, asks a
//! [`RouteLookup`](crate::routing::RouteLookup) for the travel times of the
//! segments it touched, and then refreshes start and end times downstream
//! until they stop changing. Everything visible goes out through a
//! [`Renderer`]; anything the user should hear about goes through a
//! [`Notifier`].

mod collab;
mod config;
mod engine;

pub use collab::{
    DEFAULT_FEED_CAPACITY, FeedPage, FormInput, InputProvider, Notice, Notifier, NullRenderer,
    RecordingNotifier, RecordingRenderer, RenderCommand, Renderer, TracingNotifier,
};
pub use config::PlannerConfig;
pub use engine::{Planner, PlannerError};
