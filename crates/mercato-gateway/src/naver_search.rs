//! Naver search client: shopping listings, blog review snippets and
//! blog/cafe mention counts
//!
//! All endpoints share one quota, so every call goes through the same
//! [`RateLimiter`].

use crate::datalab::status_error;
use crate::error::{Error, Result};
use crate::gateway::NaverCredentials;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::types::{MentionCounts, ShoppingItem, ShoppingQuery};
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default shopping search endpoint
pub const SHOPPING_URL: &str = "https://openapi.naver.com/v1/search/shop.json";

/// Default blog search endpoint
pub const BLOG_URL: &str = "https://openapi.naver.com/v1/search/blog.json";

/// Default cafe article search endpoint
pub const CAFE_URL: &str = "https://openapi.naver.com/v1/search/cafearticle.json";

const SHOPPING_PROVIDER: &str = "naver_shopping";
const BLOG_PROVIDER: &str = "naver_blog";
const CAFE_PROVIDER: &str = "naver_cafe";

/// Source of shopping listings and review text
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShoppingSource: Send + Sync {
    /// Search product listings
    async fn search_products(&self, query: &ShoppingQuery) -> Result<Vec<ShoppingItem>>;

    /// Collect review-like snippets about a product
    async fn search_reviews(&self, product: &str, limit: usize) -> Result<Vec<String>>;

    /// Count blog and cafe posts mentioning a product
    async fn count_mentions(&self, product: &str) -> Result<MentionCounts>;
}

#[derive(Deserialize)]
struct SearchResponse<T> {
    #[serde(default)]
    total: u64,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShopItem {
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    lprice: String,
    #[serde(default)]
    mall_name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    category1: String,
}

#[derive(Deserialize)]
struct BlogItem {
    #[serde(default)]
    description: String,
}

/// Naver search HTTP client
pub struct NaverSearchClient {
    client: Client,
    credentials: NaverCredentials,
    shop_url: String,
    blog_url: String,
    cafe_url: String,
    limiter: RateLimiter,
}

static MARKUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]+>|&[a-z]+;").expect("MARKUP_REGEX is a compile-time constant")
});

/// Remove `<b>` highlights and HTML entities from search snippets
pub(crate) fn strip_markup(text: &str) -> String {
    MARKUP_REGEX.replace_all(text, "").trim().to_string()
}

impl NaverSearchClient {
    /// Create a client
    pub fn new(
        credentials: NaverCredentials,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NotConfigured(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            shop_url: SHOPPING_URL.to_string(),
            blog_url: BLOG_URL.to_string(),
            cafe_url: CAFE_URL.to_string(),
            limiter: RateLimiter::new(RateLimitConfig::per_second(requests_per_second)),
        })
    }

    /// Override endpoints (for proxies and tests)
    #[must_use]
    pub fn with_urls(mut self, shop_url: impl Into<String>, blog_url: impl Into<String>) -> Self {
        self.shop_url = shop_url.into();
        self.blog_url = blog_url.into();
        self
    }

    /// Override the cafe search endpoint
    #[must_use]
    pub fn with_cafe_url(mut self, cafe_url: impl Into<String>) -> Self {
        self.cafe_url = cafe_url.into();
        self
    }

    async fn get_items<T: DeserializeOwned>(
        &self,
        provider: &'static str,
        url: &str,
        query: &str,
        display: u32,
    ) -> Result<Vec<T>> {
        let parsed: SearchResponse<T> = self.get(provider, url, query, display).await?;
        if parsed.items.is_empty() {
            return Err(Error::unavailable(provider, "no items returned"));
        }
        Ok(parsed.items)
    }

    /// Total hit count reported by a search endpoint
    async fn get_total(&self, provider: &'static str, url: &str, query: &str) -> Result<u64> {
        let parsed: SearchResponse<serde::de::IgnoredAny> =
            self.get(provider, url, query, 1).await?;
        Ok(parsed.total)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        provider: &'static str,
        url: &str,
        query: &str,
        display: u32,
    ) -> Result<SearchResponse<T>> {
        self.limiter.wait_for_slot().await;

        let display = display.to_string();
        let response = self
            .client
            .get(url)
            .header("X-Naver-Client-Id", &self.credentials.client_id)
            .header("X-Naver-Client-Secret", &self.credentials.client_secret)
            .query(&[("query", query), ("display", display.as_str()), ("sort", "sim")])
            .send()
            .await
            .map_err(|e| Error::unavailable(provider, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(provider, status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::unavailable(provider, format!("malformed body: {e}")))
    }

    fn convert_item(item: ShopItem) -> ShoppingItem {
        ShoppingItem {
            title: strip_markup(&item.title),
            link: item.link,
            lprice: item.lprice.trim().parse().unwrap_or(0),
            mall_name: item.mall_name,
            brand: item.brand,
            category: item.category1,
        }
    }
}

#[async_trait::async_trait]
impl ShoppingSource for NaverSearchClient {
    #[instrument(skip(self, query), fields(query = %query.query))]
    async fn search_products(&self, query: &ShoppingQuery) -> Result<Vec<ShoppingItem>> {
        debug!("Requesting shopping listings");
        let items: Vec<ShopItem> = self
            .get_items(SHOPPING_PROVIDER, &self.shop_url, &query.query, query.display)
            .await?;

        Ok(items.into_iter().map(Self::convert_item).collect())
    }

    #[instrument(skip(self))]
    async fn search_reviews(&self, product: &str, limit: usize) -> Result<Vec<String>> {
        debug!("Requesting blog review snippets");
        let search = format!("{product} 후기");
        let display = limit.clamp(1, 100) as u32;
        let items: Vec<BlogItem> = self
            .get_items(BLOG_PROVIDER, &self.blog_url, &search, display)
            .await?;

        let snippets: Vec<String> = items
            .into_iter()
            .map(|i| strip_markup(&i.description))
            .filter(|s| !s.is_empty())
            .collect();

        if snippets.is_empty() {
            return Err(Error::unavailable(BLOG_PROVIDER, "snippets were empty"));
        }
        Ok(snippets)
    }

    #[instrument(skip(self))]
    async fn count_mentions(&self, product: &str) -> Result<MentionCounts> {
        debug!("Requesting blog and cafe mention counts");
        let blog = self.get_total(BLOG_PROVIDER, &self.blog_url, product).await?;
        let cafe = self.get_total(CAFE_PROVIDER, &self.cafe_url, product).await?;
        Ok(MentionCounts { blog, cafe })
    }
}
