pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod locations;
pub mod log;
pub mod matcher;
pub mod merge;
pub mod providers;
pub mod rates;
pub mod render;
pub mod report;
pub mod selector;
pub mod standard;
pub mod ui;

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::FileCatalog;
use crate::config::AppConfig;
use crate::context::{TravelerContext, TripContext};
use crate::engine::Engine;
use crate::locations::TableResolver;
use crate::merge::MergeStrategy;
use crate::providers::caching::CachedRateSource;
use crate::providers::rest_rates::RestRateSource;
use crate::rates::{FixedRateSource, RateSource};

/// Inputs of the `match` command, already validated at the CLI boundary.
#[derive(Debug, Clone, Default)]
pub struct MatchParams {
    pub country: Option<String>,
    pub city: Option<String>,
    pub city_level: Option<u8>,
    pub role: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub position_level: Option<u8>,
    pub project_code: Option<String>,
    pub days: u32,
    /// Defaults to today.
    pub as_of: Option<NaiveDate>,
    /// Defaults to the configured display currency.
    pub currency: Option<String>,
    /// Defaults to the configured strategy.
    pub strategy: Option<MergeStrategy>,
}

pub enum AppCommand {
    Match(Box<MatchParams>),
    Rates { refresh: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Travel standard matcher starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let source: Box<dyn RateSource> = match &config.providers.rates {
        Some(provider) => Box::new(RestRateSource::new(&provider.base_url)),
        None => Box::new(FixedRateSource::default()),
    };
    let rates = Arc::new(CachedRateSource::new(source));

    match command {
        AppCommand::Match(params) => run_match(&config, rates, *params).await,
        AppCommand::Rates { refresh } => run_rates(rates, refresh).await,
    }
}

async fn run_match(
    config: &AppConfig,
    rates: Arc<CachedRateSource<Box<dyn RateSource>>>,
    params: MatchParams,
) -> Result<()> {
    let catalog = FileCatalog::load(&config.standards_file)?;
    let resolver = TableResolver::new(config.locations.clone());
    let engine = Engine::new(Arc::new(catalog), rates).with_resolver(Arc::new(resolver));

    let traveler = TravelerContext {
        role: params.role,
        position: params.position,
        department: params.department,
        position_level: params.position_level,
        project_code: params.project_code,
        city_location_id: None,
        country_location_id: None,
    };
    let trip = TripContext {
        country: params.country,
        city: params.city,
        city_level: params.city_level,
        days: params.days.max(1),
    };

    let as_of = params
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let strategy = params.strategy.unwrap_or(config.strategy);
    let currency = params.currency.unwrap_or_else(|| config.currency.clone());

    let pb = ui::new_spinner("Matching travel standards...");
    let report = engine
        .match_and_compute(&traveler, &trip, as_of, strategy, &currency)
        .await;
    pb.finish_and_clear();

    println!("{}", report::display_as_table(&report?));
    Ok(())
}

async fn run_rates(
    rates: Arc<CachedRateSource<Box<dyn RateSource>>>,
    refresh: bool,
) -> Result<()> {
    let pb = ui::new_spinner("Loading exchange rates...");
    let table = if refresh {
        rates.refresh().await
    } else {
        Ok(rates.current().await)
    };
    pb.finish_and_clear();
    let table = table?;

    let mut display = ui::new_styled_table();
    display.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate (per CNY)"),
    ]);
    for (code, rate) in table.currencies() {
        display.add_row(vec![code.to_string(), format!("{rate:.4}")]);
    }
    println!("{display}");
    Ok(())
}
