//! Hypixel SkyBlock API access
//!
//! This crate provides the pieces every market service shares: a rotating
//! key pool, a process-wide throttle and the HTTP fetch client.

pub mod client;
pub mod error;
pub mod key_pool;
pub mod throttle;
pub mod types;

pub use client::{HypixelClient, KeyMode};
pub use error::FetchError;
pub use key_pool::KeyPool;
pub use throttle::{Throttle, ThrottleClosed, ThrottlePermit, ThrottleStats};
