//! Web layer for the day planner.
//!
//! Provides JSON endpoints for editing the itinerary and polling what the
//! planner rendered and reported.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
