//! Engine façade composing selection, matching, merge and rendering.
//!
//! Matching always reads the current catalog state — there is no
//! point-in-time snapshot of standards. Callers who need a stable record
//! must persist the returned report at submission time; a later re-match
//! against an edited catalog can legitimately differ.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::StandardsCatalog;
use crate::context::{MatchContext, TravelerContext, TripContext};
use crate::locations::{LocationKind, LocationResolver};
use crate::merge::{self, MergeStrategy};
use crate::rates::RateSource;
use crate::render::{self, RenderedLimit};
use crate::selector;
use crate::standard::Standard;

/// Per-standard metadata carried in reports for client display.
#[derive(Debug, Clone, Serialize)]
pub struct StandardInfo {
    pub code: String,
    pub name: String,
    pub version: u32,
    pub priority: u8,
}

impl From<&Standard> for StandardInfo {
    fn from(standard: &Standard) -> Self {
        StandardInfo {
            code: standard.code.clone(),
            name: standard.name.clone(),
            version: standard.version,
            priority: standard.priority,
        }
    }
}

/// Result of the match phase. Zero matches is a valid outcome.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matched: bool,
    pub standards: Vec<Standard>,
}

/// Full match-and-compute result.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub matched: bool,
    pub strategy: MergeStrategy,
    pub matched_count: usize,
    pub currency: String,
    /// First matched standard in priority order.
    pub primary: Option<StandardInfo>,
    pub all_matched: Vec<StandardInfo>,
    pub expenses: BTreeMap<String, RenderedLimit>,
}

impl MatchReport {
    fn no_match(strategy: MergeStrategy, currency: &str) -> Self {
        MatchReport {
            matched: false,
            strategy,
            matched_count: 0,
            currency: currency.trim().to_uppercase(),
            primary: None,
            all_matched: Vec::new(),
            expenses: BTreeMap::new(),
        }
    }
}

/// The matching engine. Stateless per invocation apart from whatever
/// caching the injected rate source does; safe to share across tasks.
pub struct Engine {
    catalog: Arc<dyn StandardsCatalog>,
    rates: Arc<dyn RateSource>,
    resolver: Option<Arc<dyn LocationResolver>>,
}

impl Engine {
    pub fn new(catalog: Arc<dyn StandardsCatalog>, rates: Arc<dyn RateSource>) -> Self {
        Engine {
            catalog,
            rates,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn LocationResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Standards applicable to the traveler and trip on `as_of`, in
    /// priority order.
    pub async fn match_standards(
        &self,
        traveler: &TravelerContext,
        trip: &TripContext,
        as_of: NaiveDate,
    ) -> Result<MatchOutcome> {
        let standards = self.catalog.fetch_standards().await?;
        Ok(self.match_against(&standards, traveler, trip, as_of))
    }

    /// Merge the matched standards' entries and render them in
    /// `target_currency`.
    pub async fn compute_expenses(
        &self,
        matched: &[Standard],
        strategy: MergeStrategy,
        target_currency: &str,
    ) -> Result<BTreeMap<String, RenderedLimit>> {
        let table = self.rates.load_rates().await?;
        let merged = merge::merge_expenses(matched, strategy);
        Ok(render::render_expenses(&merged, &table, target_currency))
    }

    /// Match and compute in one call. Standards and rates are fetched
    /// concurrently.
    pub async fn match_and_compute(
        &self,
        traveler: &TravelerContext,
        trip: &TripContext,
        as_of: NaiveDate,
        strategy: MergeStrategy,
        target_currency: &str,
    ) -> Result<MatchReport> {
        let (standards, table) = futures::join!(
            self.catalog.fetch_standards(),
            self.rates.load_rates()
        );
        let standards = standards?;
        let table = table?;

        let outcome = self.match_against(&standards, traveler, trip, as_of);
        if !outcome.matched {
            info!(%as_of, "No travel standard matched");
            return Ok(MatchReport::no_match(strategy, target_currency));
        }

        let merged = merge::merge_expenses(&outcome.standards, strategy);
        let expenses = render::render_expenses(&merged, &table, target_currency);

        Ok(MatchReport {
            matched: true,
            strategy,
            matched_count: outcome.standards.len(),
            currency: target_currency.trim().to_uppercase(),
            primary: outcome.standards.first().map(StandardInfo::from),
            all_matched: outcome.standards.iter().map(StandardInfo::from).collect(),
            expenses,
        })
    }

    fn match_against(
        &self,
        standards: &[Standard],
        traveler: &TravelerContext,
        trip: &TripContext,
        as_of: NaiveDate,
    ) -> MatchOutcome {
        let ctx = self.build_context(traveler, trip);
        let candidates = selector::select_candidates(standards, as_of);
        let matched = selector::match_standards(candidates, &ctx);
        debug!(matched = matched.len(), "Match phase complete");
        MatchOutcome {
            matched: !matched.is_empty(),
            standards: matched,
        }
    }

    /// Pre-resolve location identities when the caller did not supply them.
    fn build_context(&self, traveler: &TravelerContext, trip: &TripContext) -> MatchContext {
        let mut traveler = traveler.clone();

        if let Some(resolver) = &self.resolver {
            if traveler.city_location_id.is_none() {
                if let Some(city) = &trip.city {
                    traveler.city_location_id = resolver.resolve(city, LocationKind::City);
                }
            }
            if traveler.country_location_id.is_none() {
                if let Some(country) = &trip.country {
                    traveler.country_location_id =
                        resolver.resolve(country, LocationKind::Country);
                }
            }
        }

        MatchContext::new(traveler, trip.clone())
    }
}
