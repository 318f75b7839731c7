//! Difference report between the best sell and best buy location

use serde::Serialize;
use std::fmt;

use crate::types::AggregatedQuote;

/// Buy-low/sell-high summary for one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceDifference {
    /// `sell_price_min` of the best sell location (what you pay)
    pub best_sell: u64,
    /// `buy_price_max` of the best buy location (what you receive)
    pub best_buy: u64,
    /// `best_buy - best_sell`, negative when there is no margin
    pub profit: i64,
}

impl PriceDifference {
    /// Read the marked records; a missing mark counts as 0
    pub fn from_quotes(quotes: &[AggregatedQuote]) -> Self {
        let best_buy = quotes
            .iter()
            .find(|q| q.is_best_buy)
            .map(|q| q.buy_price_max)
            .unwrap_or(0);
        let best_sell = quotes
            .iter()
            .find(|q| q.is_best_sell)
            .map(|q| q.sell_price_min)
            .unwrap_or(0);

        Self::new(best_buy, best_sell)
    }

    pub fn new(best_buy: u64, best_sell: u64) -> Self {
        let profit = (best_buy as i128 - best_sell as i128)
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Self {
            best_sell,
            best_buy,
            profit,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.profit > 0
    }
}

impl fmt::Display for PriceDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bought for {} | Sell for {} | Profit {}",
            group_thousands(self.best_sell as i128),
            group_thousands(self.best_buy as i128),
            group_thousands(self.profit as i128),
        )
    }
}

/// Format an integer with comma thousands separators ("-1,234,567")
pub fn group_thousands(value: impl Into<i128>) -> String {
    let value: i128 = value.into();
    let digits = value.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
