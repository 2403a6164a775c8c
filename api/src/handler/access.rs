use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    access::{
        event::{RegisterEntry, RegisterExit},
        AccessKind, AccessMethod, AccessOutcome,
    },
    plate::Plate,
    vehicle::VehicleCategory,
};
use kernel::repository::access::AccessHistoryQuery;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUnit,
    model::access::{
        AccessEventsResponse, AccessHistoryParams, RegisterQuery, RegisterResponse,
        VerifyPlateResponse,
    },
};

pub async fn verify_plate(
    Path((plate, category)): Path<(String, i32)>,
    State(registry): State<AppRegistry>,
) -> AppResult<(StatusCode, Json<VerifyPlateResponse>)> {
    let plate = Plate::parse(&plate)?;
    let outcome = registry
        .access_repository()
        .resolve(&plate, VehicleCategory::new(category), Utc::now())
        .await;

    // 判定できなかった場合は拒否と区別して 503 を返す
    let status = match &outcome {
        AccessOutcome::ResolutionFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    tracing::info!(plate = %plate, category, outcome = ?outcome, "Plate verified");

    Ok((status, Json(outcome.into())))
}

pub async fn register_entry_resident(
    Path(plate): Path<String>,
    Query(query): Query<RegisterQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RegisterResponse>> {
    register_entry(AccessKind::Resident, plate, query, registry).await
}

pub async fn register_entry_visitor(
    Path(plate): Path<String>,
    Query(query): Query<RegisterQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RegisterResponse>> {
    register_entry(AccessKind::Visitor, plate, query, registry).await
}

async fn register_entry(
    kind: AccessKind,
    plate: String,
    query: RegisterQuery,
    registry: AppRegistry,
) -> AppResult<Json<RegisterResponse>> {
    let plate = Plate::parse(&plate)?;
    let method = query.method.unwrap_or(AccessMethod::Automatic);

    let access_event_id = registry
        .access_repository()
        .register_entry(RegisterEntry::new(kind, plate.clone(), method, Utc::now()))
        .await?;

    Ok(Json(RegisterResponse {
        success: true,
        access_event_id,
        message: format!("{kind} entry registered for {plate}"),
    }))
}

pub async fn register_exit(
    Path(plate): Path<String>,
    Query(query): Query<RegisterQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RegisterResponse>> {
    let plate = Plate::parse(&plate)?;
    let method = query.method.unwrap_or(AccessMethod::Automatic);

    let access_event_id = registry
        .access_repository()
        .register_exit(RegisterExit::new(plate.clone(), method, Utc::now()))
        .await?;

    Ok(Json(RegisterResponse {
        success: true,
        access_event_id,
        message: format!("exit registered for {plate}"),
    }))
}

pub async fn show_access_events(
    unit: AuthorizedUnit,
    Query(params): Query<AccessHistoryParams>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AccessEventsResponse>> {
    params.validate(&())?;

    registry
        .access_history_repository()
        .find_by_unit(&unit.unit_id, AccessHistoryQuery::new(params.q, params.limit))
        .await
        .map(AccessEventsResponse::from)
        .map(Json)
}
