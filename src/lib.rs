//! QuoteWatch Library
//!
//! Auto-refreshing per-location market quotes with best buy/sell selection

pub mod client;
pub mod config;
pub mod market;
pub mod polling;
pub mod types;
