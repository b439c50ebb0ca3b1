//! OpenAPI documentation for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    ChainResponse, ClaimResponse, CreatePoolRequest, CreatePoolResponse, DeployResponse,
    DepositRequest, GovernanceResponse, PaginationMeta, PoolCountResponse, PoolDetailResponse,
    PoolExistenceResponse, PoolListResponse, PoolSummaryDto, PoolUpdateResponse,
    SetBlockHeightRequest, SetCreationFeeRequest, SetGovernanceAddressRequest,
    SetPoolStatusRequest, ShareResponse, UpdatePoolRequest, WithdrawResponse,
};
use crate::api::extract::PRINCIPAL_HEADER;
use crate::api::handlers::{chain, governance, pool, position, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI document of the gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Yield Pool Gateway API",
        description = "Pooled-deposit registry: pool creation behind a governance fee, \
                       share accounting, lock periods with withdrawal penalties, and \
                       linear yield claims.",
        license(name = "MIT")
    ),
    tags(
        (name = "System", description = "Health and parameter catalog"),
        (name = "Governance", description = "Governance address and creation fee"),
        (name = "Pools", description = "Pool lifecycle"),
        (name = "Positions", description = "Deposits, withdrawals and yield"),
        (name = "Chain", description = "Block height clock")
    ),
    paths(
        system::health_handler,
        system::pool_types_handler,
        governance::get_governance,
        governance::set_governance_address,
        governance::set_creation_fee,
        pool::create_pool,
        pool::list_pools,
        pool::pool_count,
        pool::find_by_name,
        pool::get_pool,
        pool::update_pool,
        pool::set_pool_status,
        pool::last_update,
        position::deposit,
        position::withdraw,
        position::deploy,
        position::claim,
        position::get_share,
        chain::get_chain,
        chain::set_height,
        chain::advance,
    ),
    components(
        schemas(
            ErrorResponse,
            ErrorBody,
            PaginationMeta,
            system::HealthResponse,
            system::PoolCatalog,
            GovernanceResponse,
            SetGovernanceAddressRequest,
            SetCreationFeeRequest,
            CreatePoolRequest,
            CreatePoolResponse,
            UpdatePoolRequest,
            SetPoolStatusRequest,
            PoolDetailResponse,
            PoolSummaryDto,
            PoolListResponse,
            PoolCountResponse,
            PoolExistenceResponse,
            PoolUpdateResponse,
            DepositRequest,
            ShareResponse,
            WithdrawResponse,
            ClaimResponse,
            DeployResponse,
            ChainResponse,
            SetBlockHeightRequest,
            chain::AdvanceBlocksRequest,
        )
    ),
    modifiers(&PrincipalAddon)
)]
pub struct ApiDoc;

/// Registers the caller identity header as a security scheme.
struct PrincipalAddon;

impl utoipa::Modify for PrincipalAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "principal",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(PRINCIPAL_HEADER),
                    ),
                ),
            );
        }
    }
}

/// Returns the OpenAPI JSON document.
#[must_use]
pub fn openapi_json() -> String {
    ApiDoc::openapi().to_pretty_json().unwrap_or_default()
}
