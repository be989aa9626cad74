//! Traveler and trip inputs for a match request.

use serde::{Deserialize, Serialize};

use crate::standard::ConditionType;

/// Who is traveling. Not persisted by this crate; callers assemble it from
/// their user directory. The location ids are optional pre-resolved
/// identities used by identity-first city/country matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelerContext {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position_level: Option<u8>,
    #[serde(default)]
    pub project_code: Option<String>,
    #[serde(default)]
    pub city_location_id: Option<String>,
    #[serde(default)]
    pub country_location_id: Option<String>,
}

/// Where and for how long. `days` is consumed by callers applying PER_DAY
/// limits; the matching and merge logic itself never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripContext {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// City tier, 1-4.
    #[serde(default)]
    pub city_level: Option<u8>,
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    1
}

impl Default for TripContext {
    fn default() -> Self {
        TripContext {
            country: None,
            city: None,
            city_level: None,
            days: 1,
        }
    }
}

/// The combined view the condition evaluator reads from.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    pub traveler: TravelerContext,
    pub trip: TripContext,
}

impl MatchContext {
    pub fn new(traveler: TravelerContext, trip: TripContext) -> Self {
        MatchContext { traveler, trip }
    }

    /// The context's string value for a condition type. Numeric fields are
    /// rendered as strings so IN/EQUAL conditions can test them too.
    pub fn value_for(&self, condition_type: ConditionType) -> Option<String> {
        match condition_type {
            ConditionType::Country => self.trip.country.clone(),
            ConditionType::City => self.trip.city.clone(),
            ConditionType::CityLevel => self.trip.city_level.map(|l| l.to_string()),
            ConditionType::PositionLevel => self.traveler.position_level.map(|l| l.to_string()),
            ConditionType::Role => self.traveler.role.clone(),
            ConditionType::Position => self.traveler.position.clone(),
            ConditionType::Department => self.traveler.department.clone(),
            ConditionType::ProjectCode => self.traveler.project_code.clone(),
            ConditionType::Unknown => None,
        }
    }

    /// The resolved location identity for city/country condition types,
    /// when the caller supplied one.
    pub fn location_id_for(&self, condition_type: ConditionType) -> Option<&str> {
        match condition_type {
            ConditionType::City => self.traveler.city_location_id.as_deref(),
            ConditionType::Country => self.traveler.country_location_id.as_deref(),
            _ => None,
        }
    }
}
