//! Shared DTO types and helpers used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::GatewayError;

/// Pagination and filter query parameters for `GET /pools`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PoolListParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Only list pools of this type (`lending`, `staking`, `yield-farming`).
    #[serde(default)]
    pub pool_type: Option<String>,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PoolListParams {
    /// Clamps `per_page` to the allowed maximum of 100 and `page` to at
    /// least 1.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
            pool_type: self.pool_type.clone(),
        }
    }
}

/// Parses a string-encoded u128 amount.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] naming `field` if `raw` is not
/// a non-negative integer.
pub fn parse_amount(field: &str, raw: &str) -> Result<u128, GatewayError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|_| GatewayError::InvalidRequest(format!("invalid {field}: {raw}")))
}
