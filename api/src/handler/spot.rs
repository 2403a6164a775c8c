use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use kernel::model::{id::SpotNumber, spot::event::UpdateOccupancy};
use registry::AppRegistry;
use shared::error::AppResult;

use crate::model::spot::{AvailabilityResponse, UpdateOccupancyRequest};

pub async fn show_availability(
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailabilityResponse>> {
    registry
        .spot_repository()
        .availability(Utc::now())
        .await
        .map(AvailabilityResponse::from)
        .map(Json)
}

pub async fn update_occupancy(
    Path(spot_number): Path<i32>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateOccupancyRequest>,
) -> AppResult<StatusCode> {
    registry
        .spot_repository()
        .update_occupancy(UpdateOccupancy::new(SpotNumber::new(spot_number), req.occupied))
        .await
        .map(|_| StatusCode::OK)
}
