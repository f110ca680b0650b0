#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Storefront public API.
//!
//! These types are re-used by the client runtime, the session store, and the
//! CLI so every surface decodes the same contract. Error payloads are decoded
//! independently of success payloads, which is why they live beside them here.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Structured 422 payload listing field-level validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpValidationError {
    /// Individual validation failures reported by the API.
    #[serde(default)]
    pub detail: Vec<ValidationIssue>,
}

impl HttpValidationError {
    /// Dotted field paths for every reported issue, in server order.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.detail.iter().map(ValidationIssue::field).collect()
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the offending value (e.g. `["query", "limit"]`).
    pub loc: Vec<LocationSegment>,
    /// Human-readable description of the failure.
    pub msg: String,
    /// Machine-readable failure type.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    /// Render the location as a dotted path (`body.items.0.name`).
    #[must_use]
    pub fn field(&self) -> String {
        self.loc
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Segment of a validation location: either a field name or a list index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LocationSegment {
    /// Named field.
    Field(String),
    /// Position within a list.
    Index(u64),
}

impl Display for LocationSegment {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => formatter.write_str(name),
            Self::Index(index) => write!(formatter, "{index}"),
        }
    }
}

/// Structured 404 payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceNotFound {
    /// Error discriminator, `ResourceNotFound` for this payload.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description of what was missing.
    pub detail: String,
}

/// Pagination metadata returned alongside list payloads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Total number of matching resources across all pages.
    pub total_count: u64,
    /// Highest addressable page number.
    pub max_page: u32,
}

/// Paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResource<T> {
    /// Resources on the requested page.
    pub items: Vec<T>,
    /// Pagination metadata.
    pub pagination: Pagination,
}

/// Pricing model of the product an order was placed for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductPriceType {
    /// Single purchase.
    OneTime,
    /// Subscription billing.
    Recurring,
}

impl ProductPriceType {
    /// Wire representation used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Recurring => "recurring",
        }
    }
}

impl Display for ProductPriceType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    /// Order identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    /// Amount charged, in minor currency units.
    pub amount: i64,
    /// Tax portion of the amount, in minor currency units.
    #[serde(default)]
    pub tax_amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Purchasing user.
    pub user_id: String,
    /// Purchased product.
    pub product_id: String,
    /// Price the product was purchased at.
    #[serde(default)]
    pub product_price_id: Option<String>,
    /// Subscription the order belongs to, if recurring.
    #[serde(default)]
    pub subscription_id: Option<String>,
}

/// Invoice link for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderInvoice {
    /// Pre-signed URL of the rendered invoice.
    pub url: String,
}

/// Aggregated order statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrdersStatistics {
    /// One entry per reporting period.
    pub periods: Vec<OrdersStatisticsPeriod>,
}

/// Order statistics for a single reporting period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrdersStatisticsPeriod {
    /// First day of the period.
    pub date: NaiveDate,
    /// Orders placed in the period.
    pub orders: u64,
    /// Earnings in minor currency units.
    pub earnings: i64,
    /// Orders expected from active subscriptions.
    #[serde(default)]
    pub expected_orders: u64,
    /// Earnings expected from active subscriptions.
    #[serde(default)]
    pub expected_earnings: i64,
}

impl OrdersStatistics {
    /// Sum of earnings across all periods, saturating at the `i64` bounds.
    #[must_use]
    pub fn total_earnings(&self) -> i64 {
        self.periods
            .iter()
            .fold(0_i64, |total, period| total.saturating_add(period.earnings))
    }
}

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRead {
    /// User identifier.
    pub id: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Display name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Avatar image, when set.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Payout account, when connected.
    #[serde(default)]
    pub account_id: Option<String>,
}
