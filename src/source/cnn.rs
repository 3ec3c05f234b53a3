//! CNN Fear & Greed source using the public graph-data endpoint.
//!
//! The endpoint is queried once per cycle with the current date appended to
//! the base URL, e.g. `.../graphdata/2024-03-01`. The response carries the
//! score under `fear_and_greed.score`:
//!
//! ```json
//! { "fear_and_greed": { "score": 62.345, "rating": "greed" } }
//! ```
//!
//! The endpoint rejects obvious bots, so requests carry browser-like headers.
//! That is only a courtesy to the endpoint's filtering and may stop working
//! at any time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT,
};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::ObservationSource;
use crate::config::DEFAULT_SOURCE_URL;
use crate::error::FetchError;
use crate::observation::{round_score, Granularity, Observation};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";
const BROWSER_REFERER: &str = "https://edition.cnn.com";

/// Source for the CNN Fear & Greed index.
#[derive(Debug, Clone)]
pub struct CnnSource {
    client: Client,
    base_url: String,
    granularity: Granularity,
    description: String,
}

impl CnnSource {
    /// Create a new builder for configuring the source.
    pub fn builder() -> CnnSourceBuilder {
        CnnSourceBuilder::default()
    }

    /// URL queried for the date of `now`.
    pub fn url_for(&self, now: &DateTime<Local>) -> String {
        format!("{}{}", self.base_url, now.format("%Y-%m-%d"))
    }
}

#[async_trait]
impl ObservationSource for CnnSource {
    async fn fetch(&self, now: DateTime<Local>) -> Result<Observation, FetchError> {
        let url = self.url_for(&now);
        debug!(%url, "Requesting indicator");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        info!(status = status.as_u16(), "Indicator source responded");

        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let value = parse_score(&body)?;
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            warn!(%value, "Score outside the expected 0-100 range");
        }

        Ok(Observation::new(self.granularity.stamp(&now), value))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for CnnSource.
#[derive(Debug, Default)]
pub struct CnnSourceBuilder {
    base_url: Option<String>,
    granularity: Option<Granularity>,
    timeout: Option<Duration>,
    no_proxy: bool,
}

impl CnnSourceBuilder {
    /// Set the base URL; the date is appended verbatim.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set how observations are stamped (default: date only).
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Ignore system proxy settings.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Build the source.
    pub fn build(self) -> Result<CnnSource, FetchError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));

        let mut client = Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers());
        if self.no_proxy {
            client = client.no_proxy();
        }
        let client = client
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let description = format!("cnn: {}", base_url);

        Ok(CnnSource {
            client,
            base_url,
            granularity: self.granularity.unwrap_or(Granularity::Date),
            description,
        })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Extract and round the score from a graph-data response body.
pub fn parse_score(body: &str) -> Result<Decimal, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyOrInvalidBody("empty body".to_string()));
    }

    let data: GraphData = serde_json::from_str(body)
        .map_err(|e| FetchError::EmptyOrInvalidBody(e.to_string()))?;

    if let Some(rating) = &data.fear_and_greed.rating {
        debug!(%rating, score = data.fear_and_greed.score, "Parsed indicator");
    }

    round_score(data.fear_and_greed.score).ok_or_else(|| {
        FetchError::EmptyOrInvalidBody(format!(
            "score {} is not a finite number",
            data.fear_and_greed.score
        ))
    })
}

/// Graph-data response from the endpoint. Only the headline score is used.
#[derive(Debug, Deserialize)]
struct GraphData {
    fear_and_greed: FearAndGreed,
}

#[derive(Debug, Deserialize)]
struct FearAndGreed {
    score: f64,
    #[serde(default)]
    rating: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_builder_defaults() {
        let source = CnnSource::builder().build().unwrap();
        assert_eq!(source.base_url, DEFAULT_SOURCE_URL);
        assert_eq!(source.granularity, Granularity::Date);
        assert_eq!(
            source.description(),
            "cnn: https://production.dataviz.cnn.io/index/fearandgreed/graphdata/"
        );
    }

    #[test]
    fn test_url_for_appends_date() {
        let source = CnnSource::builder()
            .base_url("http://localhost:8080/graphdata/")
            .build()
            .unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        assert_eq!(source.url_for(&now), "http://localhost:8080/graphdata/2024-03-01");
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();
        assert_eq!(headers.len(), 5);
        assert_eq!(headers.get("dnt").unwrap(), "1");
        assert_eq!(headers.get(CONNECTION).unwrap(), "keep-alive");
        assert!(headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_parse_score_rounds() {
        let body = r#"{"fear_and_greed":{"score":62.345}}"#;
        assert_eq!(parse_score(body).unwrap(), Decimal::from_str("62.35").unwrap());
    }

    #[test]
    fn test_parse_score_ignores_extra_fields() {
        let body = r#"{
            "fear_and_greed": {"score": 21.0571428571, "rating": "extreme fear", "previous_close": 25.1},
            "market_momentum_sp500": {"score": 3.2}
        }"#;
        assert_eq!(parse_score(body).unwrap(), Decimal::from_str("21.06").unwrap());
    }

    #[test]
    fn test_parse_score_integer_score() {
        let body = r#"{"fear_and_greed":{"score":50}}"#;
        assert_eq!(parse_score(body).unwrap(), Decimal::from(50));
    }

    #[test]
    fn test_parse_score_empty_body() {
        for body in ["", "   ", "\n"] {
            assert!(matches!(
                parse_score(body),
                Err(FetchError::EmptyOrInvalidBody(_))
            ));
        }
    }

    #[test]
    fn test_parse_score_invalid_bodies() {
        for body in [
            "<html>Access denied</html>",
            r#"{"fear_and_greed":{}}"#,
            r#"{"fear_and_greed":{"score":"high"}}"#,
            r#"{"score":62.3}"#,
        ] {
            assert!(
                matches!(parse_score(body), Err(FetchError::EmptyOrInvalidBody(_))),
                "expected invalid body error for {}",
                body
            );
        }
    }
}
