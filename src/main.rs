use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tsmatch::log::init_logging;
use tsmatch::{AppCommand, MatchParams};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Match travel standards and compute expense limits
    Match {
        /// Destination country name
        #[arg(long)]
        country: Option<String>,
        /// Destination city name
        #[arg(long)]
        city: Option<String>,
        /// City tier, 1-4
        #[arg(long)]
        city_level: Option<u8>,
        /// Traveler role
        #[arg(long)]
        role: Option<String>,
        /// Traveler position
        #[arg(long)]
        position: Option<String>,
        /// Traveler department
        #[arg(long)]
        department: Option<String>,
        /// Traveler position level
        #[arg(long)]
        position_level: Option<u8>,
        /// Project code
        #[arg(long)]
        project_code: Option<String>,
        /// Trip length in days
        #[arg(long, default_value_t = 1)]
        days: u32,
        /// Match date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Display currency (defaults to the configured one)
        #[arg(long)]
        currency: Option<String>,
        /// Merge strategy: PRIORITY, MERGE_BEST or MERGE_ALL
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Display the exchange rate table
    Rates {
        /// Force a reload from the live source
        #[arg(long)]
        refresh: bool,
    },
}

fn to_app_command(cmd: Commands) -> Result<AppCommand> {
    match cmd {
        Commands::Setup => unreachable!("Setup command should be handled separately"),
        Commands::Match {
            country,
            city,
            city_level,
            role,
            position,
            department,
            position_level,
            project_code,
            days,
            date,
            currency,
            strategy,
        } => {
            // Reject bad dates and strategies here, before the engine runs.
            let as_of = date
                .map(|d| d.parse())
                .transpose()
                .context("Invalid date, expected YYYY-MM-DD")?;
            let strategy = strategy.map(|s| s.parse()).transpose()?;

            Ok(AppCommand::Match(Box::new(MatchParams {
                country,
                city,
                city_level,
                role,
                position,
                department,
                position_level,
                project_code,
                days,
                as_of,
                currency,
                strategy,
            })))
        }
        Commands::Rates { refresh } => Ok(AppCommand::Rates { refresh }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => match to_app_command(cmd) {
            Ok(command) => tsmatch::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> Result<()> {
    let path = tsmatch::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    let config_dir = path
        .parent()
        .context("Config path has no parent directory")?;
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create directory: {}", config_dir.display()))?;

    let standards_path = config_dir.join("standards.yaml");
    let default_config = format!(
        r#"---
standards_file: "{}"

locations: []

# providers:
#   rates:
#     base_url: "https://example.com/fx"

currency: "CNY"
strategy: "MERGE_BEST"
"#,
        standards_path.display()
    );

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    let default_standards = r#"---
standards:
  - code: "STD-DEFAULT"
    name: "Default travel standard"
    status: active
    priority: 50
    effective_date: 2025-01-01
    expense_entries:
      - expense_item_id: "accommodation"
        item_name: "Accommodation"
        limit_type: FIXED
        limit_amount: 500
        calc_unit: PER_DAY
      - expense_item_id: "meal"
        item_name: "Meals"
        limit_type: FIXED
        limit_amount: 150
        calc_unit: PER_DAY
"#;

    if !standards_path.exists() {
        std::fs::write(&standards_path, default_standards).with_context(|| {
            format!(
                "Failed to write standards file to {}",
                standards_path.display()
            )
        })?;
    }

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
