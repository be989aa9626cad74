//! Conflict resolution across matched standards.
//!
//! Input is the matched set in selector order (highest priority first).
//! Each strategy is a small reducer over an item-keyed map; all amounts
//! stay in CNY here, currency rendering happens downstream.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::standard::{CalcUnit, ExpenseLimitEntry, LimitType, Standard};

/// How overlapping expense entries from multiple matched standards combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStrategy {
    /// Only the highest-priority matched standard contributes.
    Priority,
    /// Item-by-item most traveler-favorable limit across all matched
    /// standards.
    #[default]
    MergeBest,
    /// Every matched standard's entries appear side by side, keyed by
    /// item and standard.
    MergeAll,
}

impl FromStr for MergeStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PRIORITY" => Ok(MergeStrategy::Priority),
            "MERGE_BEST" => Ok(MergeStrategy::MergeBest),
            "MERGE_ALL" => Ok(MergeStrategy::MergeAll),
            _ => Err(anyhow::anyhow!(
                "Invalid merge strategy: {} (expected PRIORITY, MERGE_BEST or MERGE_ALL)",
                s
            )),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeStrategy::Priority => "PRIORITY",
            MergeStrategy::MergeBest => "MERGE_BEST",
            MergeStrategy::MergeAll => "MERGE_ALL",
        };
        write!(f, "{s}")
    }
}

/// A resolved limit, still CNY-denominated. Missing amount fields in the
/// catalog entry resolve to zero rather than failing the merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitValue {
    Fixed { amount: f64 },
    Range { min: f64, max: f64 },
    Actual,
    Percentage { percentage: f64, base_amount: f64 },
}

impl LimitValue {
    fn from_entry(entry: &ExpenseLimitEntry) -> Self {
        match entry.limit_type {
            LimitType::Fixed => LimitValue::Fixed {
                amount: entry.limit_amount.unwrap_or(0.0),
            },
            LimitType::Range => LimitValue::Range {
                min: entry.limit_min.unwrap_or(0.0),
                max: entry.limit_max.unwrap_or(0.0),
            },
            LimitType::Actual => LimitValue::Actual,
            LimitType::Percentage => LimitValue::Percentage {
                percentage: entry.percentage.unwrap_or(0.0),
                base_amount: entry.base_amount.unwrap_or(0.0),
            },
        }
    }

    pub fn limit_type(&self) -> LimitType {
        match self {
            LimitValue::Fixed { .. } => LimitType::Fixed,
            LimitValue::Range { .. } => LimitType::Range,
            LimitValue::Actual => LimitType::Actual,
            LimitValue::Percentage { .. } => LimitType::Percentage,
        }
    }
}

/// One resolved expense item with its audit trail of contributing standards.
#[derive(Debug, Clone)]
pub struct MergedEntry {
    pub expense_item_id: String,
    pub item_name: String,
    pub limit: LimitValue,
    pub calc_unit: CalcUnit,
    /// Codes of every matched standard that carried this item, in encounter
    /// order, deduplicated. Set semantics for comparisons; order is a
    /// presentation detail.
    pub source_standards: Vec<String>,
}

impl MergedEntry {
    fn from_entry(entry: &ExpenseLimitEntry, standard_code: &str) -> Self {
        MergedEntry {
            expense_item_id: entry.expense_item_id.clone(),
            item_name: entry.display_name().to_string(),
            limit: LimitValue::from_entry(entry),
            calc_unit: entry.calc_unit,
            source_standards: vec![standard_code.to_string()],
        }
    }

    fn record_source(&mut self, standard_code: &str) {
        if !self.source_standards.iter().any(|c| c == standard_code) {
            self.source_standards.push(standard_code.to_string());
        }
    }
}

/// Reduce the matched standards' expense entries into one map under the
/// given strategy. Keys are expense item ids, except under MERGE_ALL where
/// they are `"{item_id}_{standard_code}"` so entries stay side by side.
pub fn merge_expenses(
    matched: &[Standard],
    strategy: MergeStrategy,
) -> BTreeMap<String, MergedEntry> {
    let merged = match strategy {
        MergeStrategy::Priority => merge_priority(matched),
        MergeStrategy::MergeBest => merge_best(matched),
        MergeStrategy::MergeAll => merge_all(matched),
    };
    debug!(%strategy, standards = matched.len(), items = merged.len(), "Merged expense entries");
    merged
}

fn merge_priority(matched: &[Standard]) -> BTreeMap<String, MergedEntry> {
    let mut expenses = BTreeMap::new();
    let Some(primary) = matched.first() else {
        return expenses;
    };

    // Duplicate item ids within one standard should not occur; last wins.
    for entry in &primary.expense_entries {
        expenses.insert(
            entry.expense_item_id.clone(),
            MergedEntry::from_entry(entry, &primary.code),
        );
    }
    expenses
}

fn merge_best(matched: &[Standard]) -> BTreeMap<String, MergedEntry> {
    let mut expenses: BTreeMap<String, MergedEntry> = BTreeMap::new();

    for standard in matched {
        for entry in &standard.expense_entries {
            match expenses.entry(entry.expense_item_id.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(MergedEntry::from_entry(entry, &standard.code));
                }
                Entry::Occupied(mut occupied) => {
                    let existing = occupied.get_mut();
                    merge_entry_best(existing, entry);
                    existing.record_source(&standard.code);
                }
            }
        }
    }
    expenses
}

/// Item-level "best for the traveler" rules, evaluated in order:
/// ACTUAL always wins; FIXED vs FIXED keeps the larger amount; RANGE vs
/// RANGE widens to cover both; any other combination keeps the existing
/// entry. The incoming standard is always recorded as a source.
fn merge_entry_best(existing: &mut MergedEntry, incoming: &ExpenseLimitEntry) {
    let incoming_limit = LimitValue::from_entry(incoming);

    match (existing.limit, incoming_limit) {
        (_, LimitValue::Actual) => {
            existing.limit = LimitValue::Actual;
        }
        (LimitValue::Fixed { amount }, LimitValue::Fixed { amount: new_amount }) => {
            if new_amount > amount {
                existing.limit = LimitValue::Fixed { amount: new_amount };
                existing.calc_unit = incoming.calc_unit;
            }
        }
        (
            LimitValue::Range { min, max },
            LimitValue::Range {
                min: new_min,
                max: new_max,
            },
        ) => {
            existing.limit = LimitValue::Range {
                min: min.min(new_min),
                max: max.max(new_max),
            };
        }
        _ => {}
    }
}

fn merge_all(matched: &[Standard]) -> BTreeMap<String, MergedEntry> {
    let mut expenses = BTreeMap::new();

    for standard in matched {
        for entry in &standard.expense_entries {
            let key = format!("{}_{}", entry.expense_item_id, standard.code);
            let mut merged = MergedEntry::from_entry(entry, &standard.code);
            merged.item_name = format!("{} ({})", entry.display_name(), standard.code);
            expenses.insert(key, merged);
        }
    }
    expenses
}
