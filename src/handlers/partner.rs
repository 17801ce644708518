use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, Request,
        State,
    },
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::ingest;
use crate::models::{IdQuery, PartnerRecord};
use crate::services::PartnerService;
use crate::AppState;

/// GET /api/partners
pub async fn list_partners(State(state): State<AppState>) -> Result<Json<Vec<PartnerRecord>>> {
    let partners = PartnerService::list_partners(&state.db).await?;
    Ok(Json(partners))
}

/// POST /api/partners (multipart: name, website, description, optional logo)
pub async fn create_partner(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse>> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let store = state.storage.partners();

    let ingested = ingest::ingest(multipart, store).await?;
    let partner = PartnerService::create_partner(&state.db, store, ingested).await?;

    Ok(Json(ApiResponse::created(
        partner.id,
        "Partner added successfully",
    )))
}

/// PUT /api/partners?id=xxx
pub async fn update_partner(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
    req: Request,
) -> Result<Json<ApiResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let store = state.storage.partners();
    let ingested = ingest::parse_update_body(req, store).await?;
    PartnerService::update_partner(&state.db, store, query.id, ingested).await?;
    Ok(Json(ApiResponse::message("Partner updated successfully")))
}

/// DELETE /api/partners?id=xxx
pub async fn delete_partner(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<ApiResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    PartnerService::delete_partner(&state.db, state.storage.partners(), query.id).await?;
    Ok(Json(ApiResponse::message("Partner deleted successfully")))
}
