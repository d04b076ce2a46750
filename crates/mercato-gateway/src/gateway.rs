//! DataGateway - provider facade with synthetic fallback

use crate::datalab::{DataLabClient, TrendSource, DATALAB_URL};
use crate::error::{Error, Result};
use crate::naver_search::{NaverSearchClient, ShoppingSource};
use crate::synthetic;
use crate::types::{
    MentionCounts, ProviderResult, ShoppingItem, ShoppingQuery, TrendQuery, TrendSeries,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default bound for a single provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Client ID and secret pair for Naver open APIs
#[derive(Clone)]
pub struct NaverCredentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
}

// SECURITY: never print the secret
impl fmt::Debug for NaverCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .finish()
    }
}

impl NaverCredentials {
    /// Build credentials when both halves are present and non-blank
    #[must_use]
    pub fn from_parts(client_id: Option<&str>, client_secret: Option<&str>) -> Option<Self> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                Some(Self {
                    client_id: id.trim().to_string(),
                    client_secret: secret.trim().to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Settings used to assemble the live provider clients
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Bound for each provider call
    pub timeout: Duration,
    /// DataLab credentials; synthetic trends when absent
    pub datalab: Option<NaverCredentials>,
    /// DataLab endpoint
    pub datalab_url: String,
    /// Naver search credentials; synthetic listings and snippets when absent
    pub shopping: Option<NaverCredentials>,
    /// Naver search call budget per second
    pub shopping_requests_per_second: u32,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            datalab: None,
            datalab_url: DATALAB_URL.to_string(),
            shopping: None,
            shopping_requests_per_second: 10,
        }
    }
}

/// Uniform access to market data.
///
/// Each method returns data in every case: live data when the provider
/// answers in time, otherwise the synthetic substitute for the same query.
pub struct DataGateway {
    trend: Option<Arc<dyn TrendSource>>,
    shopping: Option<Arc<dyn ShoppingSource>>,
    timeout: Duration,
}

impl DataGateway {
    /// A gateway without live providers
    #[must_use]
    pub fn synthetic_only() -> Self {
        Self {
            trend: None,
            shopping: None,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Build live clients for every configured provider
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self> {
        let mut gateway = Self::synthetic_only().with_timeout(settings.timeout);

        if let Some(credentials) = &settings.datalab {
            let client =
                DataLabClient::new(credentials.clone(), &settings.datalab_url, settings.timeout)?;
            gateway = gateway.with_trend_source(Arc::new(client));
        }
        if let Some(credentials) = &settings.shopping {
            let client = NaverSearchClient::new(
                credentials.clone(),
                settings.timeout,
                settings.shopping_requests_per_second,
            )?;
            gateway = gateway.with_shopping_source(Arc::new(client));
        }

        info!(
            trend = gateway.trend.is_some(),
            shopping = gateway.shopping.is_some(),
            "Data gateway initialized"
        );
        Ok(gateway)
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a live trend source
    #[must_use]
    pub fn with_trend_source(mut self, source: Arc<dyn TrendSource>) -> Self {
        self.trend = Some(source);
        self
    }

    /// Use a live shopping source
    #[must_use]
    pub fn with_shopping_source(mut self, source: Arc<dyn ShoppingSource>) -> Self {
        self.shopping = Some(source);
        self
    }

    /// Names of providers that will be answered synthetically
    #[must_use]
    pub fn synthetic_providers(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.trend.is_none() {
            missing.push("datalab");
        }
        if self.shopping.is_none() {
            missing.push("naver_search");
        }
        missing
    }

    /// Keyword interest series
    pub async fn trend(&self, query: &TrendQuery) -> ProviderResult<TrendSeries> {
        if let Some(source) = &self.trend {
            if let Some(series) = self.attempt("datalab", source.fetch_trend(query)).await {
                return ProviderResult::live(series);
            }
        } else {
            debug!("DataLab not configured, using synthetic trend");
        }
        ProviderResult::synthetic(synthetic::trend_series(query))
    }

    /// Shopping listings
    pub async fn products(&self, query: &ShoppingQuery) -> ProviderResult<Vec<ShoppingItem>> {
        if let Some(source) = &self.shopping {
            if let Some(items) = self
                .attempt("naver_shopping", source.search_products(query))
                .await
            {
                return ProviderResult::live(items);
            }
        } else {
            debug!("Naver search not configured, using synthetic listings");
        }
        ProviderResult::synthetic(synthetic::shopping_items(query))
    }

    /// Review-like text snippets about a product
    pub async fn reviews(&self, product: &str, limit: usize) -> ProviderResult<Vec<String>> {
        if let Some(source) = &self.shopping {
            if let Some(snippets) = self
                .attempt("naver_blog", source.search_reviews(product, limit))
                .await
            {
                return ProviderResult::live(snippets);
            }
        } else {
            debug!("Naver search not configured, using synthetic reviews");
        }
        ProviderResult::synthetic(synthetic::review_snippets(product, limit))
    }

    /// Blog and cafe posts mentioning a product
    pub async fn mentions(&self, product: &str) -> ProviderResult<MentionCounts> {
        if let Some(source) = &self.shopping {
            if let Some(counts) = self
                .attempt("naver_ugc", source.count_mentions(product))
                .await
            {
                return ProviderResult::live(counts);
            }
        } else {
            debug!("Naver search not configured, using synthetic mention counts");
        }
        ProviderResult::synthetic(synthetic::mention_counts(product))
    }

    async fn attempt<T>(
        &self,
        provider: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(data)) => Some(data),
            Ok(Err(error)) => {
                log_failure(provider, &error);
                None
            }
            Err(_) => {
                log_failure(
                    provider,
                    &Error::unavailable(
                        provider,
                        format!("timed out after {}ms", self.timeout.as_millis()),
                    ),
                );
                None
            }
        }
    }
}

fn log_failure(provider: &'static str, error: &Error) {
    if error.is_rejection() {
        warn!(
            provider,
            kind = "rejected",
            error = %error,
            "Provider rejected the request, check its credentials; using synthetic data"
        );
    } else {
        info!(
            provider,
            kind = "unavailable",
            error = %error,
            "Provider unavailable, using synthetic data"
        );
    }
}
