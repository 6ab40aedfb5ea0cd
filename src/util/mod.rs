//! Shared helpers: clocks and rate limiting

pub mod rate_limit;
pub mod time;
