mod auth;
mod json_error;
mod panic;
pub mod rate_limit;

pub use auth::{AuthRejection, CurrentUser, MaybeUser, authenticate, optional_auth, require_auth};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
pub use rate_limit::{
    FixedWindowLimiter, NoopRateLimiter, RateDecision, RateLimitLayer, RateLimiter,
};
