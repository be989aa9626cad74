//! Candidate selection and match-set construction.
//!
//! `select_candidates` applies the eligibility filter and the ordering that
//! the PRIORITY merge strategy and "primary standard" reporting depend on:
//! priority descending, then effective date descending.

use chrono::NaiveDate;
use tracing::debug;

use crate::context::MatchContext;
use crate::matcher;
use crate::standard::Standard;

/// Standards that are active and within their effective window on `as_of`,
/// ordered by priority descending then effective date descending. The sort
/// is stable, so catalog order breaks full ties.
pub fn select_candidates(standards: &[Standard], as_of: NaiveDate) -> Vec<Standard> {
    let mut candidates: Vec<Standard> = standards
        .iter()
        .filter(|s| s.is_effective(as_of))
        .cloned()
        .collect();

    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.effective_date.cmp(&a.effective_date))
    });

    debug!(
        total = standards.len(),
        eligible = candidates.len(),
        %as_of,
        "Selected candidate standards"
    );
    candidates
}

/// Prune candidates to those whose conditions the context satisfies,
/// preserving the selector's ordering. An empty result is a valid,
/// reportable outcome, not an error.
pub fn match_standards(candidates: Vec<Standard>, ctx: &MatchContext) -> Vec<Standard> {
    candidates
        .into_iter()
        .filter(|standard| {
            let matched = matcher::matches_standard(standard, ctx);
            debug!(code = %standard.code, matched, "Evaluated standard");
            matched
        })
        .collect()
}
