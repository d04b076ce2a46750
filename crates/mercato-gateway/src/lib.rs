//! Mercato Gateway - external market data
//!
//! A uniform facade over the data providers the agents consult:
//! - DataLab: keyword search-interest series
//! - Naver search: shopping listings, blog review snippets and mention counts
//!
//! Every call runs under a timeout. When a provider is unconfigured or fails,
//! the gateway answers with deterministic synthetic data seeded from the
//! query, so callers always get a usable result.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod datalab;
pub mod error;
pub mod gateway;
pub mod naver_search;
pub mod rate_limit;
pub mod synthetic;
pub mod types;

pub use datalab::{DataLabClient, TrendSource};
pub use error::{Error, Result};
pub use gateway::{DataGateway, GatewaySettings, NaverCredentials};
pub use naver_search::{NaverSearchClient, ShoppingSource};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use types::{
    DataSource, MentionCounts, ProviderResult, ShoppingItem, ShoppingQuery, TimeUnit, TrendPoint, TrendQuery,
    TrendSeries,
};
