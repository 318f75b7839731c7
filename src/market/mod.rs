//! Market module - Per-location quote roll-up
//!
//! Merges raw per-location quotes, marks the best buy and best sell
//! locations and derives the profit between them. Every step is a pure,
//! single-pass transform run once per polling tick.

mod aggregator;
mod best_price;
mod report;

pub use aggregator::aggregate;
pub use best_price::select_best;
pub use report::{group_thousands, PriceDifference};

use crate::types::{AggregatedQuote, RawQuote};

/// Result of running one batch of raw quotes through the whole pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub quotes: Vec<AggregatedQuote>,
    pub difference: PriceDifference,
}

/// Aggregate, mark best prices and compute the difference
pub fn evaluate(raw: &[RawQuote]) -> MarketSnapshot {
    let quotes = select_best(aggregate(raw));
    let difference = PriceDifference::from_quotes(&quotes);
    MarketSnapshot { quotes, difference }
}
