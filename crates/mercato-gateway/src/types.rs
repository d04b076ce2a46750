//! Gateway request and response types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Granularity of a trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// One point per day
    Date,
    /// One point per week
    Week,
    /// One point per month
    Month,
}

impl TimeUnit {
    /// Provider wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Approximate days between two points
    #[must_use]
    pub fn step_days(&self) -> i64 {
        match self {
            Self::Date => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

/// Trend lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendQuery {
    /// Search keyword
    pub keyword: String,
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
    /// Series granularity
    pub time_unit: TimeUnit,
}

/// One point of a trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Period start date
    pub date: NaiveDate,
    /// Relative interest, 0-100
    pub value: f64,
}

/// A keyword interest series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Keyword the series belongs to
    pub keyword: String,
    /// Points in chronological order
    pub points: Vec<TrendPoint>,
}

/// Shopping listing lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingQuery {
    /// Product search text
    pub query: String,
    /// Number of listings wanted
    pub display: u32,
}

impl ShoppingQuery {
    /// Create a query for up to 10 listings
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            display: 10,
        }
    }

    /// Set the number of listings
    #[must_use]
    pub fn with_display(mut self, display: u32) -> Self {
        self.display = display.clamp(1, 100);
        self
    }
}

/// One shopping listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Listing title without markup
    pub title: String,
    /// Listing URL
    pub link: String,
    /// Lowest price in KRW
    pub lprice: u64,
    /// Seller
    pub mall_name: String,
    /// Brand, when known
    pub brand: String,
    /// Top-level category, when known
    pub category: String,
}

/// Blog and cafe posts mentioning a product
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionCounts {
    /// Blog posts
    pub blog: u64,
    /// Cafe articles
    pub cafe: u64,
}

impl MentionCounts {
    /// Blog and cafe posts together
    #[must_use]
    pub fn total(&self) -> u64 {
        self.blog + self.cafe
    }
}

/// Where returned data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Real provider response
    Live,
    /// Deterministic substitute
    Synthetic,
}

impl DataSource {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Synthetic => "synthetic",
        }
    }
}

/// Gateway answer: data plus its provenance
#[derive(Debug, Clone)]
pub struct ProviderResult<T> {
    /// The data
    pub data: T,
    /// Where it came from
    pub source: DataSource,
}

impl<T> ProviderResult<T> {
    /// Live provider data
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }

    /// Synthetic substitute
    pub fn synthetic(data: T) -> Self {
        Self {
            data,
            source: DataSource::Synthetic,
        }
    }

    /// Whether the data is synthetic
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}
