//! Quote Aggregator - Rolls duplicate per-location quotes into one record
//!
//! The price API returns one row per (location, quality). The table shows one
//! row per location, so duplicates are folded with an elementwise min/max.

use std::collections::HashMap;

use crate::types::{AggregatedQuote, Location, RawQuote};

/// Fold raw quotes into one `AggregatedQuote` per location.
///
/// Each group is seeded by its first entry and zeros take part in the fold,
/// so a sparse duplicate can pull a minimum down to `0`. Output keeps the
/// order in which locations first appear in `raw`.
pub fn aggregate(raw: &[RawQuote]) -> Vec<AggregatedQuote> {
    let mut totals: Vec<AggregatedQuote> = Vec::new();
    let mut index: HashMap<Location, usize> = HashMap::new();

    for quote in raw {
        match index.get(&quote.location) {
            Some(&i) => fold_into(&mut totals[i], quote),
            None => {
                index.insert(quote.location, totals.len());
                totals.push(AggregatedQuote::from(quote));
            }
        }
    }

    totals
}

fn fold_into(total: &mut AggregatedQuote, quote: &RawQuote) {
    total.sell_price_min = total.sell_price_min.min(quote.sell_price_min);
    total.sell_price_max = total.sell_price_max.max(quote.sell_price_max);
    total.buy_price_min = total.buy_price_min.min(quote.buy_price_min);
    total.buy_price_max = total.buy_price_max.max(quote.buy_price_max);
}
