//! Condition evaluation.
//!
//! The contract is fixed: groups within a standard are OR'd against each
//! other, conditions within a group are AND'd, regardless of the stored
//! `logic_operator`. A standard with no groups matches unconditionally.
//!
//! City and country conditions resolve in two phases: identity comparison
//! against `location_ids` first, then name/value comparison as the fallback
//! for catalogs configured before identity linking existed. A malformed
//! condition is logged and evaluates to false; it never aborts evaluation of
//! the remaining groups or standards.

use tracing::{debug, warn};

use crate::context::MatchContext;
use crate::standard::{Condition, ConditionGroup, ConditionOperator, ConditionType, Standard};

/// True when any condition group of the standard is satisfied by the
/// context, or when the standard carries no groups at all.
pub fn matches_standard(standard: &Standard, ctx: &MatchContext) -> bool {
    if standard.condition_groups.is_empty() {
        return true;
    }

    standard
        .condition_groups
        .iter()
        .any(|group| matches_group(group, ctx))
}

/// True when every condition in the group holds. An empty group matches.
pub fn matches_group(group: &ConditionGroup, ctx: &MatchContext) -> bool {
    group.conditions.iter().all(|cond| matches_condition(cond, ctx))
}

/// Evaluate a single condition against the context.
pub fn matches_condition(condition: &Condition, ctx: &MatchContext) -> bool {
    match match_by_identity(condition, ctx) {
        IdentityOutcome::Matched => true,
        IdentityOutcome::Rejected => false,
        IdentityOutcome::Inconclusive => match_by_name(condition, ctx),
    }
}

/// Result of the identity phase for city/country conditions.
enum IdentityOutcome {
    /// Identity decided the condition holds; skip name matching.
    Matched,
    /// Hard negative: a NOT_IN condition found the context id in its
    /// exclusion list. Name matching must NOT run.
    Rejected,
    /// No identity data, or identity found nothing conclusive; fall back
    /// to name matching.
    Inconclusive,
}

fn match_by_identity(condition: &Condition, ctx: &MatchContext) -> IdentityOutcome {
    if condition.location_ids.is_empty() {
        return IdentityOutcome::Inconclusive;
    }

    let Some(context_id) = ctx.location_id_for(condition.condition_type) else {
        return IdentityOutcome::Inconclusive;
    };

    let is_member = condition.location_ids.iter().any(|id| id == context_id);
    match condition.operator {
        ConditionOperator::In | ConditionOperator::Equal => {
            if is_member {
                debug!(
                    location_id = context_id,
                    "Condition matched by location identity"
                );
                IdentityOutcome::Matched
            } else {
                // Compatibility fallback: an id miss is not a hard negative
                // for IN/EQUAL, the names may still match.
                IdentityOutcome::Inconclusive
            }
        }
        ConditionOperator::NotIn => {
            if is_member {
                debug!(
                    location_id = context_id,
                    "Condition rejected by location identity"
                );
                IdentityOutcome::Rejected
            } else {
                IdentityOutcome::Matched
            }
        }
        // Ordinal operators have no identity semantics.
        _ => IdentityOutcome::Inconclusive,
    }
}

fn match_by_name(condition: &Condition, ctx: &MatchContext) -> bool {
    if condition.condition_type == ConditionType::Unknown {
        warn!(value = %condition.value, "Skipping condition with unknown type");
        return false;
    }

    let context_value = ctx.value_for(condition.condition_type).unwrap_or_default();
    let context_value = context_value.trim();

    let values: Vec<&str> = condition
        .value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        warn!(
            condition_type = %String::from(condition.condition_type),
            "Condition has no usable values"
        );
        return false;
    }

    match condition.operator {
        ConditionOperator::In => {
            !context_value.is_empty() && values.iter().any(|v| loose_match(v, context_value))
        }
        ConditionOperator::NotIn => {
            context_value.is_empty() || !values.iter().any(|v| loose_match(v, context_value))
        }
        ConditionOperator::Equal => values
            .iter()
            .any(|v| v.to_lowercase() == context_value.to_lowercase()),
        ConditionOperator::Gte => {
            compare_numeric(context_value, &condition.value, |ctx, lit| ctx >= lit)
        }
        ConditionOperator::Lte => {
            compare_numeric(context_value, &condition.value, |ctx, lit| ctx <= lit)
        }
        ConditionOperator::Unknown => {
            warn!(value = %condition.value, "Skipping condition with unknown operator");
            false
        }
    }
}

/// Case-insensitive equality or substring containment in either direction.
/// Tolerates administrative naming variants like "Beijing" vs "Beijing City".
fn loose_match(value: &str, context_value: &str) -> bool {
    let value = value.to_lowercase();
    let context_value = context_value.to_lowercase();
    value == context_value || context_value.contains(&value) || value.contains(&context_value)
}

fn compare_numeric(context_value: &str, literal: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let context_num = match context_value.parse::<f64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(
                context_value,
                "Numeric comparison against non-numeric context value"
            );
            return false;
        }
    };
    let literal_num = match literal.trim().parse::<f64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(literal, "Numeric comparison against non-numeric literal");
            return false;
        }
    };
    cmp(context_num, literal_num)
}
