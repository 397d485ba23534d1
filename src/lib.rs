//! crpt-api - Rate-limited document registration client
//!
//! This crate guards calls to a remote document registration endpoint with a
//! client-side sliding-window rate limiter. Callers share one limiter, wait
//! without spinning until a slot frees up, and only then send the document.

pub mod api;
pub mod config;
pub mod error;
pub mod ratelimit;

pub use api::{CrptApi, Document};
pub use error::{CrptError, Result};
