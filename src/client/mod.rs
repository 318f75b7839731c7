//! Albion Online Data API client
//!
//! Fetches current per-city prices from the Albion Online Data Project and
//! item descriptions from the official game-info API.
//! Price endpoint: GET {prices_url}/{item}.json?locations=A,B,...

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::polling::{FetchError, ItemMetadataFetcher, QuoteFetcher};
use crate::types::{ItemMetadata, ItemQuality, Location, LocationFilter, RawQuote};

/// One row of the price endpoint (one per city and quality)
#[derive(Debug, Clone, Deserialize)]
struct PriceRow {
    #[serde(default)]
    item_id: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    quality: u8,
    #[serde(default)]
    sell_price_min: u64,
    #[serde(default)]
    sell_price_max: u64,
    #[serde(default)]
    buy_price_min: u64,
    #[serde(default)]
    buy_price_max: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDataResponse {
    #[serde(default)]
    unique_name: String,
    #[serde(default)]
    tier: Option<u8>,
    #[serde(default)]
    localized_names: Option<HashMap<String, String>>,
}

/// HTTP client for prices and item metadata
pub struct AlbionDataClient {
    client: Client,
    prices_url: String,
    items_url: String,
}

impl AlbionDataClient {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("quotewatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            prices_url: config.prices_url.trim_end_matches('/').to_string(),
            items_url: config.items_url.trim_end_matches('/').to_string(),
        })
    }

    fn prices_endpoint(&self, item: &str) -> String {
        format!("{}/{}.json", self.prices_url, item)
    }

    fn item_endpoint(&self, item: &str) -> String {
        format!("{}/{}/data", self.items_url, item)
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        require_body(url, response.text().await?)
    }
}

/// A successful response without a body means the API has nothing for us
fn require_body(url: &str, body: String) -> Result<String, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Unavailable(format!("{} returned an empty body", url)));
    }
    Ok(body)
}

/// Comma separated `locations` query value
fn locations_param(locations: &[Location]) -> String {
    locations
        .iter()
        .map(|l| l.parameter_name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a price response body into raw quotes.
///
/// Missing price fields count as 0. Rows for cities we do not know are
/// dropped.
fn parse_prices(body: &str) -> Result<Vec<RawQuote>, FetchError> {
    let rows: Vec<PriceRow> = serde_json::from_str(body)?;

    let quotes = rows
        .into_iter()
        .filter_map(|row| {
            let Some(location) = Location::from_str(&row.city) else {
                debug!(item = %row.item_id, city = %row.city, "Skipping unknown location");
                return None;
            };
            Some(RawQuote {
                location,
                quality: ItemQuality::from_code(row.quality).unwrap_or_default(),
                sell_price_min: row.sell_price_min,
                sell_price_max: row.sell_price_max,
                buy_price_min: row.buy_price_min,
                buy_price_max: row.buy_price_max,
            })
        })
        .collect();

    Ok(quotes)
}

fn parse_item_data(item: &str, body: &str) -> Result<ItemMetadata, FetchError> {
    let data: ItemDataResponse = serde_json::from_str(body)?;

    let unique_name = if data.unique_name.is_empty() {
        item.to_string()
    } else {
        data.unique_name
    };

    Ok(ItemMetadata {
        unique_name,
        tier: data.tier,
        localized_names: data.localized_names.unwrap_or_default(),
    })
}

#[async_trait]
impl QuoteFetcher for AlbionDataClient {
    async fn fetch_quotes(
        &self,
        item: &str,
        filter: LocationFilter,
    ) -> Result<Vec<RawQuote>, FetchError> {
        let locations = filter.locations();
        if locations.is_empty() {
            debug!(item = %item, "No location category enabled, nothing to fetch");
            return Ok(Vec::new());
        }

        let url = self.prices_endpoint(item);
        let body = self
            .get_text(&url, &[("locations", locations_param(&locations))])
            .await?;
        let quotes = parse_prices(&body)?;

        debug!(item = %item, rows = quotes.len(), "Fetched price rows");
        Ok(quotes)
    }
}

#[async_trait]
impl ItemMetadataFetcher for AlbionDataClient {
    async fn fetch_item_metadata(&self, item: &str) -> Result<ItemMetadata, FetchError> {
        let url = self.item_endpoint(item);
        let body = self.get_text(&url, &[]).await?;
        parse_item_data(item, &body)
    }
}
