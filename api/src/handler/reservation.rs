use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    id::{ReservationId, SpotNumber},
    reservation::event::{AssignSpot, CancelReservation, UnassignSpot},
};
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUnit,
    model::reservation::{
        AssignSpotRequest, CreateReservationRequest, CreateReservationRequestWithUnit,
        CreatedReservationResponse, ReservationResponse, ReservationsResponse,
        UpdateReservationRequest, UpdateReservationRequestWithIds, UpdatedReservationResponse,
    },
};

pub async fn create_reservation(
    unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateReservationRequest>,
) -> AppResult<(StatusCode, Json<CreatedReservationResponse>)> {
    req.validate(&())?;

    let event = CreateReservationRequestWithUnit::new(unit.id(), Utc::now(), req).try_into()?;
    let (id, state) = registry.reservation_repository().create(event).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedReservationResponse { id, state }),
    ))
}

pub async fn show_reservation_list(
    unit: AuthorizedUnit,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationsResponse>> {
    let reservations = registry
        .reservation_repository()
        .find_by_unit(&unit.unit_id)
        .await?;
    Ok(Json(ReservationsResponse::at(reservations, Utc::now())))
}

pub async fn show_reservation(
    unit: AuthorizedUnit,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = registry
        .reservation_repository()
        .find_by_id(reservation_id, &unit.unit_id)
        .await?;
    Ok(Json(ReservationResponse::at(reservation, Utc::now())))
}

pub async fn update_reservation(
    unit: AuthorizedUnit,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateReservationRequest>,
) -> AppResult<Json<UpdatedReservationResponse>> {
    req.validate(&())?;

    let event =
        UpdateReservationRequestWithIds::new(reservation_id, unit.id(), Utc::now(), req)
            .try_into()?;
    let state = registry.reservation_repository().update(event).await?;

    Ok(Json(UpdatedReservationResponse { state }))
}

pub async fn cancel_reservation(
    unit: AuthorizedUnit,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .reservation_repository()
        .cancel(CancelReservation::new(reservation_id, unit.id()))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn assign_spot(
    unit: AuthorizedUnit,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<AssignSpotRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    registry
        .reservation_repository()
        .assign_spot(AssignSpot::new(
            reservation_id,
            unit.id(),
            SpotNumber::new(req.spot_number),
            Utc::now(),
        ))
        .await
        .map(|_| StatusCode::OK)
}

pub async fn unassign_spot(
    unit: AuthorizedUnit,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .reservation_repository()
        .unassign_spot(UnassignSpot::new(reservation_id, unit.id()))
        .await
        .map(|_| StatusCode::OK)
}
