//! Core types used throughout QuoteWatch
//!
//! Defines locations, item naming (tier, enchantment level, quality) and the
//! raw/aggregated quote records passed between the fetcher and the market engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category a trading location belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationArea {
    City,
    Village,
    BlackZoneOutpost,
}

/// Trading hub where prices are quoted independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Caerleon,
    Bridgewatch,
    FortSterling,
    Lymhurst,
    Martlock,
    Thetford,
    SwampCross,
    ForestCross,
    SteppeCross,
    HighlandCross,
    MountainCross,
    ArthursRest,
    MerlynsRest,
    MorganasRest,
}

impl Location {
    pub const ALL: [Location; 14] = [
        Location::Caerleon,
        Location::Bridgewatch,
        Location::FortSterling,
        Location::Lymhurst,
        Location::Martlock,
        Location::Thetford,
        Location::SwampCross,
        Location::ForestCross,
        Location::SteppeCross,
        Location::HighlandCross,
        Location::MountainCross,
        Location::ArthursRest,
        Location::MerlynsRest,
        Location::MorganasRest,
    ];

    /// Name used in price API query strings (e.g., "FortSterling")
    pub fn parameter_name(&self) -> &'static str {
        match self {
            Location::Caerleon => "Caerleon",
            Location::Bridgewatch => "Bridgewatch",
            Location::FortSterling => "FortSterling",
            Location::Lymhurst => "Lymhurst",
            Location::Martlock => "Martlock",
            Location::Thetford => "Thetford",
            Location::SwampCross => "SwampCross",
            Location::ForestCross => "ForestCross",
            Location::SteppeCross => "SteppeCross",
            Location::HighlandCross => "HighlandCross",
            Location::MountainCross => "MountainCross",
            Location::ArthursRest => "ArthursRest",
            Location::MerlynsRest => "MerlynsRest",
            Location::MorganasRest => "MorganasRest",
        }
    }

    /// Human readable name (e.g., "Fort Sterling")
    pub fn display_name(&self) -> &'static str {
        match self {
            Location::Caerleon => "Caerleon",
            Location::Bridgewatch => "Bridgewatch",
            Location::FortSterling => "Fort Sterling",
            Location::Lymhurst => "Lymhurst",
            Location::Martlock => "Martlock",
            Location::Thetford => "Thetford",
            Location::SwampCross => "Swamp Cross",
            Location::ForestCross => "Forest Cross",
            Location::SteppeCross => "Steppe Cross",
            Location::HighlandCross => "Highland Cross",
            Location::MountainCross => "Mountain Cross",
            Location::ArthursRest => "Arthur's Rest",
            Location::MerlynsRest => "Merlyn's Rest",
            Location::MorganasRest => "Morgana's Rest",
        }
    }

    pub fn area(&self) -> LocationArea {
        match self {
            Location::Caerleon
            | Location::Bridgewatch
            | Location::FortSterling
            | Location::Lymhurst
            | Location::Martlock
            | Location::Thetford => LocationArea::City,
            Location::SwampCross
            | Location::ForestCross
            | Location::SteppeCross
            | Location::HighlandCross
            | Location::MountainCross => LocationArea::Village,
            Location::ArthursRest | Location::MerlynsRest | Location::MorganasRest => {
                LocationArea::BlackZoneOutpost
            }
        }
    }

    /// Parse from either the parameter or the display name.
    ///
    /// Matching ignores case, spaces and apostrophes, so "Fort Sterling",
    /// "fortsterling" and "Arthurs Rest" all resolve.
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\'')
            .collect::<String>()
            .to_lowercase();

        Self::ALL
            .iter()
            .copied()
            .find(|l| l.parameter_name().to_lowercase() == key)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Enabled location categories for a price query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationFilter {
    pub cities: bool,
    pub villages: bool,
    pub black_zone_outposts: bool,
}

impl Default for LocationFilter {
    fn default() -> Self {
        Self {
            cities: true,
            villages: false,
            black_zone_outposts: false,
        }
    }
}

impl LocationFilter {
    const CITIES: u8 = 0b001;
    const VILLAGES: u8 = 0b010;
    const OUTPOSTS: u8 = 0b100;

    pub fn includes(&self, area: LocationArea) -> bool {
        match area {
            LocationArea::City => self.cities,
            LocationArea::Village => self.villages,
            LocationArea::BlackZoneOutpost => self.black_zone_outposts,
        }
    }

    /// Enabled locations in declaration order
    pub fn locations(&self) -> Vec<Location> {
        Location::ALL
            .iter()
            .copied()
            .filter(|l| self.includes(l.area()))
            .collect()
    }

    /// Packed form, used to store the filter in an atomic
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.cities {
            bits |= Self::CITIES;
        }
        if self.villages {
            bits |= Self::VILLAGES;
        }
        if self.black_zone_outposts {
            bits |= Self::OUTPOSTS;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            cities: bits & Self::CITIES != 0,
            villages: bits & Self::VILLAGES != 0,
            black_zone_outposts: bits & Self::OUTPOSTS != 0,
        }
    }
}

/// Item tier, first segment of a unique name ("T4_BAG" -> T4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemTier {
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
}

impl ItemTier {
    pub fn from_unique_name(unique_name: &str) -> Option<Self> {
        let prefix = unique_name.split('_').next()?;
        match prefix.to_uppercase().as_str() {
            "T1" => Some(ItemTier::T1),
            "T2" => Some(ItemTier::T2),
            "T3" => Some(ItemTier::T3),
            "T4" => Some(ItemTier::T4),
            "T5" => Some(ItemTier::T5),
            "T6" => Some(ItemTier::T6),
            "T7" => Some(ItemTier::T7),
            "T8" => Some(ItemTier::T8),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }
}

/// Enchantment level, the "@n" suffix of a unique name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemLevel {
    #[default]
    Level0,
    Level1,
    Level2,
    Level3,
}

impl ItemLevel {
    /// Unknown or malformed suffixes fall back to `Level0`
    pub fn from_unique_name(unique_name: &str) -> Self {
        let Some((_, suffix)) = unique_name.split_once('@') else {
            return ItemLevel::Level0;
        };
        match suffix.parse::<u8>() {
            Ok(1) => ItemLevel::Level1,
            Ok(2) => ItemLevel::Level2,
            Ok(3) => ItemLevel::Level3,
            _ => ItemLevel::Level0,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }
}

/// Item quality as reported by the price API (1 = Normal .. 5 = Masterpiece)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemQuality {
    #[default]
    Normal,
    Good,
    Outstanding,
    Excellent,
    Masterpiece,
}

impl ItemQuality {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ItemQuality::Normal),
            2 => Some(ItemQuality::Good),
            3 => Some(ItemQuality::Outstanding),
            4 => Some(ItemQuality::Excellent),
            5 => Some(ItemQuality::Masterpiece),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8 + 1
    }
}

/// Static item description fetched once when a watch starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub unique_name: String,
    pub tier: Option<u8>,
    /// Culture code ("EN-US", "DE-DE", ...) -> localized name
    pub localized_names: HashMap<String, String>,
}

impl ItemMetadata {
    pub const FALLBACK_LANGUAGE: &'static str = "EN-US";

    pub fn localized_name(&self, language: &str) -> &str {
        self.localized_names
            .get(language)
            .or_else(|| self.localized_names.get(Self::FALLBACK_LANGUAGE))
            .map(String::as_str)
            .unwrap_or(self.unique_name.as_str())
    }

    /// Window-style title, e.g. "Adept's Bag (T4)" or "Adept's Bag (T4.2)"
    /// for an enchanted item
    pub fn title(&self, language: &str) -> String {
        let tier = self
            .tier
            .or_else(|| ItemTier::from_unique_name(&self.unique_name).map(|t| t.number()));
        let name = self.localized_name(language);
        match (tier, ItemLevel::from_unique_name(&self.unique_name)) {
            (Some(tier), ItemLevel::Level0) => format!("{} (T{})", name, tier),
            (Some(tier), level) => format!("{} (T{}.{})", name, tier, level.number()),
            (None, _) => name.to_string(),
        }
    }
}

/// One price observation for one location, as returned by the fetcher.
///
/// A price of `0` means no order was observed for that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawQuote {
    pub location: Location,
    pub quality: ItemQuality,
    pub sell_price_min: u64,
    pub sell_price_max: u64,
    pub buy_price_min: u64,
    pub buy_price_max: u64,
}

impl RawQuote {
    pub fn new(
        location: Location,
        sell_price_min: u64,
        sell_price_max: u64,
        buy_price_min: u64,
        buy_price_max: u64,
    ) -> Self {
        Self {
            location,
            quality: ItemQuality::Normal,
            sell_price_min,
            sell_price_max,
            buy_price_min,
            buy_price_max,
        }
    }
}

/// Rolled-up quote, one per location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregatedQuote {
    pub location: Location,
    pub sell_price_min: u64,
    pub sell_price_max: u64,
    pub buy_price_min: u64,
    pub buy_price_max: u64,
    pub is_best_buy: bool,
    pub is_best_sell: bool,
}

impl From<&RawQuote> for AggregatedQuote {
    fn from(raw: &RawQuote) -> Self {
        Self {
            location: raw.location,
            sell_price_min: raw.sell_price_min,
            sell_price_max: raw.sell_price_max,
            buy_price_min: raw.buy_price_min,
            buy_price_max: raw.buy_price_max,
            is_best_buy: false,
            is_best_sell: false,
        }
    }
}
