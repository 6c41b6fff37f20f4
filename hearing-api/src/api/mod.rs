//! HTTP API handlers for hearing-api

pub mod health;
pub mod predict;

pub use health::{health_routes, home};
pub use predict::predict;
