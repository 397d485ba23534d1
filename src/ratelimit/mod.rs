//! Rate limiting logic and state management.

mod limiter;
mod window;

pub use limiter::SlidingWindowLimiter;
pub use window::{LimiterConfig, TimeWindow};
