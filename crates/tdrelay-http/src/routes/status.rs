//! Status endpoint handler.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tdrelay_core::StatsSnapshot;
use uuid::Uuid;

use crate::AppState;

/// Snapshot of the relay for operators.
#[derive(Debug, Clone, Serialize)]
pub struct RelayStatus {
    /// Number of connected browsers
    pub clients: usize,
    /// Connected browser IDs, oldest first
    pub client_ids: Vec<Uuid>,
    /// Events broadcast since startup
    pub broadcasts: u64,
    /// UDP listener counters, when a listener is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osc: Option<StatsSnapshot>,
}

/// GET /status - Connected clients and relay counters
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RelayStatus> {
    let gateway = &state.gateway;
    Json(RelayStatus {
        clients: gateway.client_count(),
        client_ids: gateway.client_ids(),
        broadcasts: gateway.broadcast_count(),
        osc: state.listener_stats.as_ref().map(|stats| stats.snapshot()),
    })
}
