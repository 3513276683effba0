//! Presentation layer for studio-concierge
//!
//! The HTTP chat surface: a single streaming endpoint plus the
//! user-facing error shape with configuration hints.

pub mod http;

pub use http::{build_router, AppState};
