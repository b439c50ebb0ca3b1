//! REST endpoint handlers organized by resource.

pub mod chain;
pub mod governance;
pub mod pool;
pub mod position;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(governance::routes())
        .merge(pool::routes())
        .merge(position::routes())
        .merge(chain::routes())
}
