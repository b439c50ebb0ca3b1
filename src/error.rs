//! Error types: registry rule violations and their HTTP mapping.
//!
//! [`PoolError`] is the closed set of reasons a registry operation can
//! refuse to commit. [`GatewayError`] is the central error type of the
//! service; it wraps [`PoolError`] and maps every variant to an HTTP status
//! code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Reason a registry operation was rejected.
///
/// A returned `PoolError` guarantees that the registry was not mutated.
/// Each variant carries a stable numeric code, see [`PoolError::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Caller may not perform the operation.
    #[error("caller is not authorized")]
    NotAuthorized,
    /// Yield rate above 100.
    #[error("yield rate must be at most 100")]
    InvalidYieldRate,
    /// Duration of zero.
    #[error("duration must be positive")]
    InvalidDuration,
    /// Penalty above 50.
    #[error("penalty must be at most 50")]
    InvalidPenalty,
    /// Threshold outside 1..=100.
    #[error("threshold must be between 1 and 100")]
    InvalidThreshold,
    /// Deposits are below the pool's deployment threshold. Shares code 105
    /// with [`PoolError::InvalidThreshold`].
    #[error("deployment threshold not met")]
    ThresholdNotMet,
    /// Another pool already uses the name.
    #[error("pool name already registered")]
    PoolAlreadyExists,
    /// No pool with the given id.
    #[error("pool not found")]
    PoolNotFound,
    /// Governance address has not been configured yet.
    #[error("governance address not configured")]
    DefiNotConfigured,
    /// Minimum deposit of zero.
    #[error("minimum deposit must be positive")]
    InvalidMinDeposit,
    /// Maximum deposit of zero, or below what is already deposited.
    #[error("maximum deposit invalid")]
    InvalidMaxDeposit,
    /// Name empty or longer than 100 characters.
    #[error("name must be 1 to 100 characters")]
    InvalidName,
    /// Registry holds its maximum number of pools.
    #[error("maximum number of pools reached")]
    MaxPoolsExceeded,
    /// Pool type outside the supported set.
    #[error("unsupported pool type")]
    InvalidPoolType,
    /// Interest rate above 20.
    #[error("interest rate must be at most 20")]
    InvalidInterestRate,
    /// Lock period above 365.
    #[error("lock period must be at most 365")]
    InvalidLockPeriod,
    /// Currency outside the supported set.
    #[error("unsupported currency")]
    InvalidCurrency,
    /// Pool is disabled.
    #[error("pool is not active")]
    InvalidStatus,
    /// Caller already holds a position in the pool.
    #[error("caller already holds shares in this pool")]
    AlreadyInPool,
    /// Caller holds no position in the pool.
    #[error("caller holds no shares in this pool")]
    NotInPool,
    /// Deposit would push the pool over capacity.
    #[error("deposit exceeds pool capacity")]
    PoolFull,
    /// Deposit amount zero or below the pool minimum.
    #[error("invalid deposit amount")]
    InvalidAmount,
    /// Lock period has not elapsed yet.
    #[error("funds are still locked")]
    FundsLocked,
    /// DeFi protocol outside the supported set.
    #[error("unsupported defi protocol")]
    InvalidDefiProtocol,
    /// Governance address is the reserved burn identity.
    #[error("governance address cannot be the burn address")]
    InvalidGovernanceAddress,
    /// Governance address was already set.
    #[error("governance address already set")]
    GovernanceAlreadySet,
    /// Ledger refused the creation-fee transfer.
    #[error("creation fee transfer failed")]
    TransferFailed,
    /// Amount arithmetic left the representable range.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl PoolError {
    /// Returns the stable numeric code of this variant.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::NotAuthorized => 100,
            Self::InvalidYieldRate => 102,
            Self::InvalidDuration => 103,
            Self::InvalidPenalty => 104,
            Self::InvalidThreshold | Self::ThresholdNotMet => 105,
            Self::PoolAlreadyExists => 106,
            Self::PoolNotFound => 107,
            Self::DefiNotConfigured => 109,
            Self::InvalidMinDeposit => 110,
            Self::InvalidMaxDeposit => 111,
            Self::InvalidName => 113,
            Self::MaxPoolsExceeded => 114,
            Self::InvalidPoolType => 115,
            Self::InvalidInterestRate => 116,
            Self::InvalidLockPeriod => 117,
            Self::InvalidCurrency => 119,
            Self::InvalidStatus => 120,
            Self::AlreadyInPool => 123,
            Self::NotInPool => 124,
            Self::PoolFull => 125,
            Self::InvalidAmount => 126,
            Self::FundsLocked => 127,
            Self::InvalidDefiProtocol => 128,
            Self::InvalidGovernanceAddress => 129,
            Self::GovernanceAlreadySet => 130,
            Self::TransferFailed => 131,
            Self::ArithmeticOverflow => 132,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAuthorized => StatusCode::FORBIDDEN,
            Self::PoolNotFound | Self::NotInPool => StatusCode::NOT_FOUND,
            Self::PoolAlreadyExists | Self::GovernanceAlreadySet | Self::AlreadyInPool => {
                StatusCode::CONFLICT
            }
            Self::MaxPoolsExceeded
            | Self::DefiNotConfigured
            | Self::InvalidStatus
            | Self::PoolFull
            | Self::FundsLocked
            | Self::ThresholdNotMet
            | Self::TransferFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ArithmeticOverflow => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidYieldRate
            | Self::InvalidDuration
            | Self::InvalidPenalty
            | Self::InvalidThreshold
            | Self::InvalidMinDeposit
            | Self::InvalidMaxDeposit
            | Self::InvalidName
            | Self::InvalidPoolType
            | Self::InvalidInterestRate
            | Self::InvalidLockPeriod
            | Self::InvalidCurrency
            | Self::InvalidAmount
            | Self::InvalidDefiProtocol
            | Self::InvalidGovernanceAddress => StatusCode::BAD_REQUEST,
        }
    }
}

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 127,
///     "message": "funds are still locked",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code. 100–199 are registry codes.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status               |
/// |-----------|---------------------|---------------------------|
/// | 100–199   | Registry rules      | see [`PoolError::status_code`] |
/// | 1000–1999 | Request validation  | 400 / 401                 |
/// | 3000–3999 | Server              | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Registry rejected the operation.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Request validation failed before reaching the registry.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No caller identity was supplied.
    #[error("missing caller identity")]
    Unauthenticated,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Pool(e) => e.code(),
            Self::InvalidRequest(_) => 1001,
            Self::Unauthenticated => 1002,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Pool(e) => e.status_code(),
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
