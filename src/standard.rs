//! Travel standard data model.
//!
//! A [`Standard`] is a versioned, date-bounded policy document. Its
//! `condition_groups` decide *who and where* it applies to; its
//! `expense_entries` carry the CNY-denominated limits it grants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardStatus {
    Draft,
    Active,
    Expired,
}

/// Stored per condition group for catalog compatibility. The evaluator
/// applies fixed semantics (AND within a group, OR across groups) and
/// never consults this field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

/// The traveler/trip attribute a condition tests against.
///
/// Catalog files may contain types this build does not know about; those
/// deserialize to `Unknown` and evaluate to a failed condition instead of
/// aborting the whole catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionType {
    Country,
    City,
    CityLevel,
    PositionLevel,
    Role,
    Position,
    Department,
    ProjectCode,
    Unknown,
}

impl From<String> for ConditionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "country" => ConditionType::Country,
            "city" => ConditionType::City,
            "city_level" => ConditionType::CityLevel,
            "position_level" => ConditionType::PositionLevel,
            "role" => ConditionType::Role,
            "position" => ConditionType::Position,
            "department" => ConditionType::Department,
            "project_code" => ConditionType::ProjectCode,
            _ => ConditionType::Unknown,
        }
    }
}

impl From<ConditionType> for String {
    fn from(t: ConditionType) -> String {
        match t {
            ConditionType::Country => "country",
            ConditionType::City => "city",
            ConditionType::CityLevel => "city_level",
            ConditionType::PositionLevel => "position_level",
            ConditionType::Role => "role",
            ConditionType::Position => "position",
            ConditionType::Department => "department",
            ConditionType::ProjectCode => "project_code",
            ConditionType::Unknown => "unknown",
        }
        .to_string()
    }
}

/// Comparison operator of a condition. Unknown operators degrade the same
/// way as unknown types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    In,
    NotIn,
    Equal,
    Gte,
    Lte,
    Unknown,
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "IN" => ConditionOperator::In,
            "NOT_IN" => ConditionOperator::NotIn,
            "EQUAL" => ConditionOperator::Equal,
            ">=" => ConditionOperator::Gte,
            "<=" => ConditionOperator::Lte,
            _ => ConditionOperator::Unknown,
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> String {
        match op {
            ConditionOperator::In => "IN",
            ConditionOperator::NotIn => "NOT_IN",
            ConditionOperator::Equal => "EQUAL",
            ConditionOperator::Gte => ">=",
            ConditionOperator::Lte => "<=",
            ConditionOperator::Unknown => "unknown",
        }
        .to_string()
    }
}

/// A single boolean test against the match context.
///
/// `value` holds one or more comma-separated literals. For `city` and
/// `country` conditions, `location_ids` optionally carries the identities of
/// the referenced locations so matching survives renames; name matching
/// remains as the fallback for catalogs configured before identity linking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: ConditionOperator,
    pub value: String,
    #[serde(default)]
    pub location_ids: Vec<String>,
}

/// A conjunctive clause: every condition in the group must hold.
/// Groups within a standard are disjunctive with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub group_id: u32,
    #[serde(default)]
    pub logic_operator: LogicOperator,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Shape of a monetary cap. All amounts are CNY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitType {
    Fixed,
    Range,
    Actual,
    Percentage,
}

/// How a unit limit multiplies over a trip. Carried through as metadata;
/// applying it is the caller's responsibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalcUnit {
    #[default]
    PerDay,
    PerTrip,
    PerKm,
}

impl CalcUnit {
    /// Suffix for display, e.g. `"USD/day"`.
    pub fn suffix(&self) -> &'static str {
        match self {
            CalcUnit::PerDay => "/day",
            CalcUnit::PerTrip => "/trip",
            CalcUnit::PerKm => "/km",
        }
    }
}

/// One expense item's limit within a standard. The type-dependent fields
/// mirror `limit_type`: FIXED uses `limit_amount`, RANGE uses
/// `limit_min`/`limit_max`, PERCENTAGE uses `percentage` plus `base_amount`,
/// ACTUAL carries no amount at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseLimitEntry {
    pub expense_item_id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    pub limit_type: LimitType,
    #[serde(default)]
    pub limit_amount: Option<f64>,
    #[serde(default)]
    pub limit_min: Option<f64>,
    #[serde(default)]
    pub limit_max: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub base_amount: Option<f64>,
    #[serde(default)]
    pub calc_unit: CalcUnit,
}

impl ExpenseLimitEntry {
    /// Display name, falling back to the item id when the catalog carries
    /// no resolved name.
    pub fn display_name(&self) -> &str {
        self.item_name.as_deref().unwrap_or(&self.expense_item_id)
    }
}

fn default_version() -> u32 {
    1
}

fn default_priority() -> u8 {
    50
}

/// A versioned travel expense policy document.
///
/// An empty `condition_groups` list means the standard applies
/// unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standard {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    pub status: StandardStatus,
    /// 0-100, higher wins ties.
    #[serde(default = "default_priority")]
    pub priority: u8,
    pub effective_date: NaiveDate,
    /// `None` = open-ended.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
    #[serde(default)]
    pub expense_entries: Vec<ExpenseLimitEntry>,
}

impl Standard {
    /// True when `as_of` falls inside the standard's effective window and
    /// the standard is active.
    pub fn is_effective(&self, as_of: NaiveDate) -> bool {
        self.status == StandardStatus::Active
            && self.effective_date <= as_of
            && self.expiry_date.is_none_or(|d| d >= as_of)
    }
}
