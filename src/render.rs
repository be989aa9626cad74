//! Currency rendering of resolved limits.
//!
//! Merge output is CNY-denominated; this module converts each entry into
//! the requested display currency. The CNY figures are always carried
//! alongside the converted ones — they are the audit source of truth.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::merge::{LimitValue, MergedEntry};
use crate::rates::RateTable;
use crate::standard::{CalcUnit, LimitType};

/// A limit ready for client display. Which amount fields are populated
/// depends on `limit_type`, mirroring the merge entry it came from.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedLimit {
    pub expense_item_id: String,
    pub item_name: String,
    pub limit_type: LimitType,
    pub currency: String,
    pub calc_unit: CalcUnit,
    /// FIXED: converted amount and the original CNY amount.
    pub amount: Option<f64>,
    pub amount_cny: Option<f64>,
    /// RANGE: endpoints converted independently.
    pub limit_min: Option<f64>,
    pub limit_max: Option<f64>,
    pub limit_min_cny: Option<f64>,
    pub limit_max_cny: Option<f64>,
    /// PERCENTAGE: the ratio is carried unconverted, only the base moves.
    pub percentage: Option<f64>,
    pub base_amount: Option<f64>,
    pub base_amount_cny: Option<f64>,
    pub source_standards: Vec<String>,
}

impl RenderedLimit {
    /// One-line human description, e.g. `"140.00 USD/day"` or
    /// `"actual cost, no ceiling"`.
    pub fn describe(&self) -> String {
        match self.limit_type {
            LimitType::Fixed => format!(
                "{:.2} {}{}",
                self.amount.unwrap_or(0.0),
                self.currency,
                self.calc_unit.suffix()
            ),
            LimitType::Range => format!(
                "{:.2}~{:.2} {}",
                self.limit_min.unwrap_or(0.0),
                self.limit_max.unwrap_or(0.0),
                self.currency
            ),
            LimitType::Actual => "actual cost, no ceiling".to_string(),
            LimitType::Percentage => format!(
                "{}% of {:.2} {}",
                self.percentage.unwrap_or(0.0),
                self.base_amount.unwrap_or(0.0),
                self.currency
            ),
        }
    }
}

/// Convert one merged entry into `currency`.
pub fn render_entry(entry: &MergedEntry, rates: &RateTable, currency: &str) -> RenderedLimit {
    let currency = currency.trim().to_uppercase();
    let mut rendered = RenderedLimit {
        expense_item_id: entry.expense_item_id.clone(),
        item_name: entry.item_name.clone(),
        limit_type: entry.limit.limit_type(),
        currency: currency.clone(),
        calc_unit: entry.calc_unit,
        amount: None,
        amount_cny: None,
        limit_min: None,
        limit_max: None,
        limit_min_cny: None,
        limit_max_cny: None,
        percentage: None,
        base_amount: None,
        base_amount_cny: None,
        source_standards: entry.source_standards.clone(),
    };

    match entry.limit {
        LimitValue::Fixed { amount } => {
            rendered.amount = Some(rates.convert_from_cny(amount, &currency));
            rendered.amount_cny = Some(amount);
        }
        LimitValue::Range { min, max } => {
            rendered.limit_min = Some(rates.convert_from_cny(min, &currency));
            rendered.limit_max = Some(rates.convert_from_cny(max, &currency));
            rendered.limit_min_cny = Some(min);
            rendered.limit_max_cny = Some(max);
        }
        LimitValue::Actual => {}
        LimitValue::Percentage {
            percentage,
            base_amount,
        } => {
            rendered.percentage = Some(percentage);
            rendered.base_amount = Some(rates.convert_from_cny(base_amount, &currency));
            rendered.base_amount_cny = Some(base_amount);
        }
    }
    rendered
}

/// Convert a whole merge result, preserving its keys.
pub fn render_expenses(
    expenses: &BTreeMap<String, MergedEntry>,
    rates: &RateTable,
    currency: &str,
) -> BTreeMap<String, RenderedLimit> {
    expenses
        .iter()
        .map(|(key, entry)| (key.clone(), render_entry(entry, rates, currency)))
        .collect()
}
