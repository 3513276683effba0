//! Upstream studio API adapters: token lifecycle, response cache, and
//! the authenticated gateway.

mod cache;
mod gateway;
pub mod query;
mod token;

pub use cache::{ResponseCache, CACHE_TTL, SWEEP_INTERVAL};
pub use gateway::{HttpAuthApi, UpstreamError, UpstreamGateway};
pub use token::{next_action, AccessToken, AuthApi, IssuedToken, TokenAction, TokenManager};
