//! Zone registry and airspace check handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utm_core::{
    AirspacePoint, ListParams, Principal, Verdict, Zone, ZoneDraft, ZoneError, ZoneListing,
};

use super::error::ApiError;
use crate::state::AppState;

/// POST /v1/zones
pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ZoneDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Zone>), ApiError> {
    let Json(draft) = payload?;
    let zone = utm_core::create_zone(state.zones(), draft, &principal, Utc::now()).await?;

    tracing::info!(
        zone_id = %zone.id,
        zone_type = zone.zone_type.as_str(),
        created_by = %principal.id,
        "Zone created"
    );
    Ok((StatusCode::CREATED, Json(zone)))
}

/// GET /v1/zones
pub async fn list_zones(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ZoneListing>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ZoneError::InvalidQuery(rejection.body_text()))?;
    let listing = utm_core::list_zones(state.zones(), &params).await?;
    Ok(Json(listing))
}

/// GET /v1/zones/:id
pub async fn get_zone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Zone>, ApiError> {
    let zone = utm_core::get_zone(state.zones(), &id).await?;
    Ok(Json(zone))
}

#[derive(Debug, Serialize)]
pub struct ArchiveResponse {
    pub message: &'static str,
    pub zone: Zone,
}

/// DELETE /v1/zones/:id
///
/// Soft delete: the zone stays readable by id with status `archived`.
pub async fn archive_zone(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ArchiveResponse>, ApiError> {
    let zone = utm_core::archive_zone(state.zones(), &id, Utc::now()).await?;

    tracing::info!(zone_id = %zone.id, archived_by = %principal.id, "Zone archived");
    Ok(Json(ArchiveResponse {
        message: "Zone archived successfully",
        zone,
    }))
}

/// A coordinate that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(n) => Some(*n),
            Coordinate::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckPointRequest {
    #[serde(default)]
    pub lat: Option<Coordinate>,
    #[serde(default)]
    pub lng: Option<Coordinate>,
    #[serde(default)]
    pub altitude: Option<Coordinate>,
}

/// POST /v1/zones/check
pub async fn check_point(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckPointRequest>, JsonRejection>,
) -> Result<Json<Verdict>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ZoneError::InvalidQuery(rejection.body_text()))?;

    let point = AirspacePoint::from_parts(
        request.lat.as_ref().and_then(Coordinate::value),
        request.lng.as_ref().and_then(Coordinate::value),
        request.altitude.as_ref().and_then(Coordinate::value),
    )?;

    let verdict = state.evaluator().evaluate(&point, Utc::now()).await?;

    tracing::debug!(
        lat = point.latitude,
        lng = point.longitude,
        altitude = point.altitude,
        status = ?verdict.status,
        matched = verdict.zones.len(),
        "Airspace check"
    );
    Ok(Json(verdict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let request: CheckPointRequest =
            serde_json::from_str(r#"{"lat": "15.5", "lng": 20, "altitude": " 30 "}"#).unwrap();
        assert_eq!(request.lat.as_ref().and_then(Coordinate::value), Some(15.5));
        assert_eq!(request.lng.as_ref().and_then(Coordinate::value), Some(20.0));
        assert_eq!(request.altitude.as_ref().and_then(Coordinate::value), Some(30.0));

        let request: CheckPointRequest =
            serde_json::from_str(r#"{"lat": "north", "lng": null}"#).unwrap();
        assert_eq!(request.lat.as_ref().and_then(Coordinate::value), None);
        assert!(request.lng.is_none());
        assert!(request.altitude.is_none());
    }
}
