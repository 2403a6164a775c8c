use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::{
    plate::Plate,
    vehicle::{
        event::{DeleteVehicle, UpdateVehicle},
        VehicleCategory,
    },
};
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUnit,
    model::vehicle::{
        CreateVehicleRequest, CreateVehicleRequestWithUnit, RegisterVisitorVehicleRequest,
        UpdateVehicleRequest, VehicleIdResponse, VehiclesResponse,
    },
};

pub async fn register_vehicle(
    unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<VehicleIdResponse>)> {
    req.validate(&())?;

    let event = CreateVehicleRequestWithUnit::new(unit.id(), req).try_into()?;
    let vehicle_id = registry.vehicle_repository().create(event).await?;
    Ok((StatusCode::CREATED, Json(VehicleIdResponse { vehicle_id })))
}

pub async fn show_vehicle_list(
    unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<VehiclesResponse>> {
    registry
        .vehicle_repository()
        .find_by_unit(&unit.unit_id)
        .await
        .map(VehiclesResponse::from)
        .map(Json)
}

pub async fn update_vehicle(
    unit: AuthorizedUnit,
    Path(plate): Path<String>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateVehicleRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    registry
        .vehicle_repository()
        .update(UpdateVehicle::new(
            Plate::parse(&plate)?,
            VehicleCategory::new(req.category),
            unit.id(),
        ))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn delete_vehicle(
    unit: AuthorizedUnit,
    Path(plate): Path<String>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .vehicle_repository()
        .delete(DeleteVehicle::new(Plate::parse(&plate)?, unit.id()))
        .await
        .map(|_| StatusCode::OK)
}

// 訪問者の車両は予約の前に登録しておく必要がある
pub async fn register_visitor_vehicle(
    _unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
    Json(req): Json<RegisterVisitorVehicleRequest>,
) -> AppResult<(StatusCode, Json<VehicleIdResponse>)> {
    req.validate(&())?;

    let vehicle_id = registry
        .vehicle_repository()
        .register_visitor(req.try_into()?)
        .await?;
    Ok((StatusCode::CREATED, Json(VehicleIdResponse { vehicle_id })))
}
