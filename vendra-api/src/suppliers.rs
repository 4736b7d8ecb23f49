use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use vendra_core::identity::CallerIdentity;
use vendra_order::metrics::DashboardSnapshot;

use crate::error::AppError;
use crate::state::AppState;

/// GET /v1/suppliers/{id}/dashboard
/// Read-only rollup of a supplier's storefront activity. Visible to the
/// supplier itself and to admins.
pub async fn supplier_dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(supplier_id): Path<Uuid>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    let is_own_dashboard = caller.supplier_id() == Some(supplier_id);
    if !caller.is_admin() && !is_own_dashboard {
        return Err(AppError::AuthorizationError(
            "not allowed to view this supplier's dashboard".to_string(),
        ));
    }

    let snapshot = state.dashboard.dashboard(supplier_id, Utc::now()).await?;
    Ok(Json(snapshot))
}
