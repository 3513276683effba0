//! HTTP surface.

mod error;
mod routes;

pub use error::{hint_for, ErrorBody};
pub use routes::{build_router, AppState};
