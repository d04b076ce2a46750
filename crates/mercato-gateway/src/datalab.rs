//! DataLab search-trend client

use crate::error::{Error, Result};
use crate::gateway::NaverCredentials;
use crate::types::{TrendPoint, TrendQuery, TrendSeries};
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default DataLab search endpoint
pub const DATALAB_URL: &str = "https://openapi.naver.com/v1/datalab/search";

const PROVIDER: &str = "datalab";

/// Source of keyword interest series
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    /// Fetch the interest series for a keyword
    async fn fetch_trend(&self, query: &TrendQuery) -> Result<TrendSeries>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataLabRequest<'a> {
    start_date: String,
    end_date: String,
    time_unit: &'static str,
    keyword_groups: Vec<KeywordGroup<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordGroup<'a> {
    group_name: &'a str,
    keywords: Vec<&'a str>,
}

#[derive(Deserialize)]
struct DataLabResponse {
    #[serde(default)]
    results: Vec<DataLabResult>,
}

#[derive(Deserialize)]
struct DataLabResult {
    #[serde(default)]
    data: Vec<DataLabPoint>,
}

#[derive(Deserialize)]
struct DataLabPoint {
    period: String,
    ratio: f64,
}

/// DataLab HTTP client
pub struct DataLabClient {
    client: Client,
    credentials: NaverCredentials,
    url: String,
}

impl DataLabClient {
    /// Create a client with a request timeout
    pub fn new(credentials: NaverCredentials, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            url: url.into(),
        })
    }

    fn request_body(query: &TrendQuery) -> DataLabRequest<'_> {
        DataLabRequest {
            start_date: query.start.format("%Y-%m-%d").to_string(),
            end_date: query.end.format("%Y-%m-%d").to_string(),
            time_unit: query.time_unit.as_str(),
            keyword_groups: vec![KeywordGroup {
                group_name: &query.keyword,
                keywords: vec![&query.keyword],
            }],
        }
    }

    fn parse_series(keyword: &str, response: DataLabResponse) -> Result<TrendSeries> {
        let points: Vec<TrendPoint> = response
            .results
            .into_iter()
            .next()
            .map(|r| r.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| {
                NaiveDate::parse_from_str(&p.period, "%Y-%m-%d")
                    .ok()
                    .map(|date| TrendPoint {
                        date,
                        value: p.ratio,
                    })
            })
            .collect();

        if points.is_empty() {
            return Err(Error::unavailable(PROVIDER, "response contained no data points"));
        }

        Ok(TrendSeries {
            keyword: keyword.to_string(),
            points,
        })
    }
}

/// Map a non-success status to a gateway error
pub(crate) fn status_error(provider: &'static str, status: StatusCode, body: &str) -> Error {
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        Error::ProviderRejected {
            provider,
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        }
    } else {
        Error::unavailable(provider, format!("status {}", status.as_u16()))
    }
}

#[async_trait::async_trait]
impl TrendSource for DataLabClient {
    #[instrument(skip(self, query), fields(keyword = %query.keyword, unit = query.time_unit.as_str()))]
    async fn fetch_trend(&self, query: &TrendQuery) -> Result<TrendSeries> {
        debug!("Requesting DataLab trend");

        let response = self
            .client
            .post(&self.url)
            .header("X-Naver-Client-Id", &self.credentials.client_id)
            .header("X-Naver-Client-Secret", &self.credentials.client_secret)
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| Error::unavailable(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status, &body));
        }

        let parsed: DataLabResponse = response
            .json()
            .await
            .map_err(|e| Error::unavailable(PROVIDER, format!("malformed body: {e}")))?;

        Self::parse_series(&query.keyword, parsed)
    }
}
