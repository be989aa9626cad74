use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::providers::util::with_retry;
use crate::rates::{RateSource, RateTable};

/// Rate source backed by a REST endpoint serving
/// `GET {base_url}/rates` -> `{"rates": {"USD": 0.14, ...}}`.
/// Rates are relative to CNY.
pub struct RestRateSource {
    base_url: String,
}

impl RestRateSource {
    pub fn new(base_url: &str) -> Self {
        RestRateSource {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateSource for RestRateSource {
    #[instrument(name = "RestRateFetch", skip(self))]
    async fn load_rates(&self) -> Result<RateTable> {
        let url = format!("{}/rates", self.base_url);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("tsmatch/1.0")
            .build()?;

        let response = with_retry(|| client.get(&url).send(), 2, 250)
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} from rate endpoint: {}",
                response.status(),
                url
            ));
        }

        let text = response.text().await?;
        let data: RatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rate response from {}: {}", url, e))?;

        if data.rates.is_empty() {
            return Err(anyhow!("Rate endpoint returned an empty table: {}", url));
        }

        Ok(RateTable::new(data.rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "rates": {
                "USD": 0.14,
                "EUR": 0.13,
                "JPY": 20.0
            }
        }"#;

        let mock_server = create_mock_server(mock_response).await;
        let source = RestRateSource::new(&mock_server.uri());

        let table = source.load_rates().await.unwrap();
        assert_eq!(table.rate("USD"), Some(0.14));
        assert_eq!(table.rate("JPY"), Some(20.0));
        // CNY is always injected.
        assert_eq!(table.rate("CNY"), Some(1.0));
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let source = RestRateSource::new(&mock_server.uri());
        let result = source.load_rates().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("HTTP error: 500 Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        // "exchange" instead of "rates"
        let mock_response = r#"{"exchange": {}}"#;
        let mock_server = create_mock_server(mock_response).await;

        let source = RestRateSource::new(&mock_server.uri());
        let result = source.load_rates().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse rate response")
        );
    }

    #[tokio::test]
    async fn test_empty_table_is_an_error() {
        let mock_response = r#"{"rates": {}}"#;
        let mock_server = create_mock_server(mock_response).await;

        let source = RestRateSource::new(&mock_server.uri());
        let result = source.load_rates().await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("empty table")
        );
    }
}
