use std::fs;
use tracing::info;

// Adds automatic logging to tests
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub const STANDARDS_YAML: &str = r#"
standards:
  - code: "STD-CN-GENERAL"
    name: "General domestic standard"
    status: active
    priority: 50
    effective_date: 2025-01-01
    expense_entries:
      - expense_item_id: "transport"
        item_name: "Transport"
        limit_type: FIXED
        limit_amount: 1500
        calc_unit: PER_TRIP
      - expense_item_id: "meal"
        item_name: "Meals"
        limit_type: FIXED
        limit_amount: 150
        calc_unit: PER_DAY
  - code: "STD-TIER1"
    name: "Tier-1 city standard"
    status: active
    priority: 80
    effective_date: 2025-02-01
    condition_groups:
      - group_id: 1
        conditions:
          - type: city_level
            operator: "<="
            value: "1"
    expense_entries:
      - expense_item_id: "transport"
        item_name: "Transport"
        limit_type: FIXED
        limit_amount: 1000
        calc_unit: PER_TRIP
      - expense_item_id: "accommodation"
        item_name: "Accommodation"
        limit_type: RANGE
        limit_min: 300
        limit_max: 800
        calc_unit: PER_DAY
"#;
}

#[test_log::test(tokio::test)]
async fn test_full_match_flow_with_rates_mock() {
    let rates_response = r#"{"rates": {"USD": 0.14, "EUR": 0.13}}"#;
    let mock_server = test_utils::create_rates_mock_server(rates_response).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let standards_path = dir.path().join("standards.yaml");
    fs::write(&standards_path, test_utils::STANDARDS_YAML).expect("Failed to write standards");

    let config_path = dir.path().join("config.yaml");
    let config_content = format!(
        r#"
standards_file: "{}"
providers:
  rates:
    base_url: "{}"
currency: "USD"
"#,
        standards_path.display(),
        mock_server.uri()
    );
    fs::write(&config_path, &config_content).expect("Failed to write config");

    info!("Running match command against mock rate server");
    let params = tsmatch::MatchParams {
        city: Some("Beijing".to_string()),
        city_level: Some(1),
        days: 3,
        as_of: Some("2025-06-01".parse().unwrap()),
        ..Default::default()
    };
    let result = tsmatch::run_command(
        tsmatch::AppCommand::Match(Box::new(params)),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Match command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_match_flow_survives_rate_source_outage() {
    // No mock server at all: the rate refresh fails and the engine must
    // fall back to the default table instead of failing the match.
    let dir = tempfile::tempdir().unwrap();
    let standards_path = dir.path().join("standards.yaml");
    fs::write(&standards_path, test_utils::STANDARDS_YAML).unwrap();

    let config_path = dir.path().join("config.yaml");
    let config_content = format!(
        r#"
standards_file: "{}"
providers:
  rates:
    base_url: "http://127.0.0.1:9"
currency: "USD"
"#,
        standards_path.display()
    );
    fs::write(&config_path, &config_content).unwrap();

    let params = tsmatch::MatchParams {
        city_level: Some(2),
        as_of: Some("2025-06-01".parse().unwrap()),
        ..Default::default()
    };
    let result = tsmatch::run_command(
        tsmatch::AppCommand::Match(Box::new(params)),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Match command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_rates_command_with_refresh() {
    let rates_response = r#"{"rates": {"USD": 0.14}}"#;
    let mock_server = test_utils::create_rates_mock_server(rates_response).await;

    let dir = tempfile::tempdir().unwrap();
    let standards_path = dir.path().join("standards.yaml");
    fs::write(&standards_path, "standards: []").unwrap();

    let config_path = dir.path().join("config.yaml");
    let config_content = format!(
        r#"
standards_file: "{}"
providers:
  rates:
    base_url: "{}"
"#,
        standards_path.display(),
        mock_server.uri()
    );
    fs::write(&config_path, &config_content).unwrap();

    let result = tsmatch::run_command(
        tsmatch::AppCommand::Rates { refresh: true },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Rates command failed: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_engine_end_to_end_merge_best() {
    use std::collections::HashMap;
    use std::sync::Arc;
    use tsmatch::catalog::{FileCatalog, StandardsCatalog};
    use tsmatch::context::{TravelerContext, TripContext};
    use tsmatch::engine::Engine;
    use tsmatch::merge::MergeStrategy;
    use tsmatch::rates::{FixedRateSource, RateTable};

    let dir = tempfile::tempdir().unwrap();
    let standards_path = dir.path().join("standards.yaml");
    fs::write(&standards_path, test_utils::STANDARDS_YAML).unwrap();

    let catalog = FileCatalog::load(&standards_path).unwrap();
    assert_eq!(catalog.fetch_standards().await.unwrap().len(), 2);

    let rates = FixedRateSource::new(RateTable::new(HashMap::from([(
        "USD".to_string(),
        0.14,
    )])));
    let engine = Engine::new(Arc::new(catalog), Arc::new(rates));

    let trip = TripContext {
        city: Some("Beijing".to_string()),
        city_level: Some(1),
        days: 3,
        ..Default::default()
    };
    let report = engine
        .match_and_compute(
            &TravelerContext::default(),
            &trip,
            "2025-06-01".parse().unwrap(),
            MergeStrategy::MergeBest,
            "USD",
        )
        .await
        .unwrap();

    assert!(report.matched);
    assert_eq!(report.matched_count, 2);
    // Higher priority standard is primary even though it is less generous
    // on transport.
    assert_eq!(report.primary.as_ref().unwrap().code, "STD-TIER1");

    // Transport: the general standard's 1500 CNY beats the tier-1 1000 CNY.
    let transport = &report.expenses["transport"];
    assert_eq!(transport.amount_cny, Some(1500.0));
    assert_eq!(transport.amount, Some(210.0));
    let mut sources = transport.source_standards.clone();
    sources.sort();
    assert_eq!(sources, vec!["STD-CN-GENERAL", "STD-TIER1"]);

    // Accommodation only exists in the tier-1 standard.
    let accommodation = &report.expenses["accommodation"];
    assert_eq!(accommodation.limit_min_cny, Some(300.0));
    assert_eq!(accommodation.limit_max, Some(112.0));
}
