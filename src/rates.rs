//! Exchange rate abstractions and conversion rules.
//!
//! Standards are maintained in CNY; display amounts are converted through a
//! [`RateTable`] where `amount_in_currency = amount_in_cny * rate`. A missing
//! rate degrades to the unconverted amount rather than failing — blocking an
//! expense submission over a rate lookup is worse than showing CNY.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Fallback rates relative to CNY, used when no live source is available.
pub const DEFAULT_RATES: &[(&str, f64)] = &[
    ("CNY", 1.0),
    ("USD", 0.14),
    ("JPY", 20.0),
    ("KRW", 180.0),
    ("EUR", 0.13),
    ("GBP", 0.11),
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mapping from currency code to rate relative to CNY. `CNY -> 1.0` always
/// holds; construction enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        let mut rates: HashMap<String, f64> = rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        rates.insert("CNY".to_string(), 1.0);
        RateTable { rates }
    }

    /// The static fallback table.
    pub fn default_table() -> Self {
        RateTable::new(
            DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        )
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(&currency.to_uppercase()).copied()
    }

    /// Currency codes in the table, sorted for display.
    pub fn currencies(&self) -> Vec<(&str, f64)> {
        let mut list: Vec<(&str, f64)> = self
            .rates
            .iter()
            .map(|(code, rate)| (code.as_str(), *rate))
            .collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }

    /// Convert a CNY amount into `currency`, rounded to 2 decimals at the
    /// point of conversion. CNY is the exact identity; an unknown code
    /// returns the amount unconverted with a warning.
    pub fn convert_from_cny(&self, amount_cny: f64, currency: &str) -> f64 {
        if amount_cny == 0.0 {
            return 0.0;
        }
        let code = currency.trim().to_uppercase();
        if code.is_empty() || code == "CNY" {
            return amount_cny;
        }

        match self.rate(&code) {
            Some(rate) => round2(amount_cny * rate),
            None => {
                warn!(currency = %code, "Exchange rate not found, using CNY amount");
                amount_cny
            }
        }
    }

    /// Convert an amount in `currency` back into CNY.
    pub fn convert_to_cny(&self, amount: f64, currency: &str) -> f64 {
        if amount == 0.0 {
            return 0.0;
        }
        let code = currency.trim().to_uppercase();
        if code.is_empty() || code == "CNY" {
            return amount;
        }

        match self.rate(&code) {
            Some(rate) => round2(amount / rate),
            None => {
                warn!(currency = %code, "Exchange rate not found, using original amount");
                amount
            }
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::default_table()
    }
}

/// Supplier of a fresh rate table. Implementations may hit the network;
/// wrap them in `providers::caching::CachedRateSource` for the TTL and
/// fallback behavior.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn load_rates(&self) -> Result<RateTable>;
}

#[async_trait]
impl RateSource for Box<dyn RateSource> {
    async fn load_rates(&self) -> Result<RateTable> {
        (**self).load_rates().await
    }
}

/// Source serving a fixed table. Used when no live provider is configured,
/// and by tests needing deterministic rates.
pub struct FixedRateSource {
    table: RateTable,
}

impl FixedRateSource {
    pub fn new(table: RateTable) -> Self {
        FixedRateSource { table }
    }
}

impl Default for FixedRateSource {
    fn default() -> Self {
        FixedRateSource::new(RateTable::default_table())
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn load_rates(&self) -> Result<RateTable> {
        Ok(self.table.clone())
    }
}
