//! Best Price Selector - Marks the best buy and best sell location
//!
//! Best buy is the highest `buy_price_max` (where to sell the item), best
//! sell is the lowest `sell_price_min` (where to buy it). Zero prices carry
//! no offer and never win.

use tracing::{debug, warn};

use crate::types::AggregatedQuote;

/// Return `quotes` with at most one `is_best_buy` and one `is_best_sell` set.
///
/// Ties go to the first record in sequence order. Any flags already present
/// on the input are cleared first.
pub fn select_best(mut quotes: Vec<AggregatedQuote>) -> Vec<AggregatedQuote> {
    for quote in quotes.iter_mut() {
        quote.is_best_buy = false;
        quote.is_best_sell = false;
    }

    if quotes.is_empty() {
        return quotes;
    }

    let max_buy = max_buy_price(&quotes);
    if max_buy == 0 {
        debug!("No buy orders at any location");
    } else {
        match quotes.iter().position(|q| q.buy_price_max == max_buy) {
            Some(i) => quotes[i].is_best_buy = true,
            None => warn!(price = max_buy, "Best buy price matches no location"),
        }
    }

    let min_sell = min_sell_price(&quotes);
    if min_sell == u64::MAX {
        debug!("No sell orders at any location");
    } else {
        match quotes.iter().position(|q| q.sell_price_min == min_sell) {
            Some(i) => quotes[i].is_best_sell = true,
            None => warn!(price = min_sell, "Best sell price matches no location"),
        }
    }

    quotes
}

/// Highest non-zero `buy_price_max`, or 0 when no location has buy orders
fn max_buy_price(quotes: &[AggregatedQuote]) -> u64 {
    quotes
        .iter()
        .map(|q| q.buy_price_max)
        .filter(|&p| p != 0)
        .max()
        .unwrap_or(0)
}

/// Lowest non-zero `sell_price_min`, or `u64::MAX` when no location has sell orders
fn min_sell_price(quotes: &[AggregatedQuote]) -> u64 {
    quotes
        .iter()
        .map(|q| q.sell_price_min)
        .filter(|&p| p != 0)
        .min()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn quote(location: Location, sell_min: u64, buy_max: u64) -> AggregatedQuote {
        AggregatedQuote {
            location,
            sell_price_min: sell_min,
            sell_price_max: sell_min,
            buy_price_min: buy_max,
            buy_price_max: buy_max,
            is_best_buy: false,
            is_best_sell: false,
        }
    }

    fn best_buy(quotes: &[AggregatedQuote]) -> Vec<Location> {
        quotes.iter().filter(|q| q.is_best_buy).map(|q| q.location).collect()
    }

    fn best_sell(quotes: &[AggregatedQuote]) -> Vec<Location> {
        quotes.iter().filter(|q| q.is_best_sell).map(|q| q.location).collect()
    }

    #[test]
    fn marks_highest_buy_and_lowest_sell() {
        let quotes = select_best(vec![
            quote(Location::Caerleon, 120, 90),
            quote(Location::Martlock, 100, 80),
            quote(Location::Thetford, 140, 110),
        ]);

        assert_eq!(best_buy(&quotes), vec![Location::Thetford]);
        assert_eq!(best_sell(&quotes), vec![Location::Martlock]);
    }

    #[test]
    fn zero_prices_never_win() {
        let quotes = select_best(vec![
            quote(Location::Caerleon, 0, 0),
            quote(Location::Martlock, 50, 0),
            quote(Location::Thetford, 70, 30),
        ]);

        assert_eq!(best_buy(&quotes), vec![Location::Thetford]);
        assert_eq!(best_sell(&quotes), vec![Location::Martlock]);
    }

    #[test]
    fn all_zero_marks_nothing() {
        let quotes = select_best(vec![
            quote(Location::Caerleon, 0, 0),
            quote(Location::Martlock, 0, 0),
        ]);

        assert!(best_buy(&quotes).is_empty());
        assert!(best_sell(&quotes).is_empty());
    }

    #[test]
    fn ties_go_to_first_in_sequence() {
        let quotes = select_best(vec![
            quote(Location::Bridgewatch, 60, 20),
            quote(Location::Lymhurst, 40, 90),
            quote(Location::FortSterling, 40, 90),
        ]);

        assert_eq!(best_buy(&quotes), vec![Location::Lymhurst]);
        assert_eq!(best_sell(&quotes), vec![Location::Lymhurst]);

        let reversed = select_best(vec![
            quote(Location::FortSterling, 40, 90),
            quote(Location::Lymhurst, 40, 90),
        ]);
        assert_eq!(best_buy(&reversed), vec![Location::FortSterling]);
    }

    #[test]
    fn stale_flags_are_replaced() {
        let mut stale = quote(Location::Caerleon, 500, 10);
        stale.is_best_buy = true;
        stale.is_best_sell = true;

        let quotes = select_best(vec![stale, quote(Location::Martlock, 100, 200)]);

        assert_eq!(best_buy(&quotes), vec![Location::Martlock]);
        assert_eq!(best_sell(&quotes), vec![Location::Martlock]);
    }

    #[test]
    fn at_most_one_flag_of_each_kind() {
        let quotes = select_best(vec![
            quote(Location::Caerleon, 10, 10),
            quote(Location::Martlock, 10, 10),
            quote(Location::Thetford, 10, 10),
            quote(Location::Lymhurst, 0, 0),
        ]);

        assert_eq!(best_buy(&quotes).len(), 1);
        assert_eq!(best_sell(&quotes).len(), 1);
    }

    #[test]
    fn empty_set_stays_empty() {
        assert!(select_best(Vec::new()).is_empty());
    }
}
