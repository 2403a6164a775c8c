use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{ReservationId, SpotNumber, UnitId},
    plate::Plate,
    reservation::{
        event::{CreateReservation, UpdateReservation},
        Reservation, ReservationState,
    },
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[garde(length(min = 1, max = 16))]
    pub plate: String,
    #[garde(length(min = 1, max = 100))]
    pub visitor_identity: String,
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(skip)]
    pub end_time: DateTime<Utc>,
    #[garde(range(min = 1))]
    pub spot_number: Option<i32>,
}

// 住戸と受付時刻をリクエストに付け加えた型
#[derive(new)]
pub struct CreateReservationRequestWithUnit(pub UnitId, pub DateTime<Utc>, pub CreateReservationRequest);

impl TryFrom<CreateReservationRequestWithUnit> for CreateReservation {
    type Error = AppError;

    fn try_from(value: CreateReservationRequestWithUnit) -> Result<Self, Self::Error> {
        let CreateReservationRequestWithUnit(
            unit_id,
            requested_at,
            CreateReservationRequest {
                plate,
                visitor_identity,
                start_time,
                end_time,
                spot_number,
            },
        ) = value;
        Ok(CreateReservation {
            plate: Plate::parse(&plate)?,
            visitor_identity: visitor_identity.trim().to_string(),
            unit_id,
            start_time,
            end_time,
            spot: spot_number.map(SpotNumber::new),
            requested_at,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationRequest {
    #[garde(length(min = 1, max = 16))]
    pub plate: String,
    #[garde(length(min = 1, max = 100))]
    pub visitor_identity: String,
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(skip)]
    pub end_time: DateTime<Utc>,
    #[garde(range(min = 1))]
    pub spot_number: Option<i32>,
}

#[derive(new)]
pub struct UpdateReservationRequestWithIds(
    pub ReservationId,
    pub UnitId,
    pub DateTime<Utc>,
    pub UpdateReservationRequest,
);

impl TryFrom<UpdateReservationRequestWithIds> for UpdateReservation {
    type Error = AppError;

    fn try_from(value: UpdateReservationRequestWithIds) -> Result<Self, Self::Error> {
        let UpdateReservationRequestWithIds(
            reservation_id,
            requested_unit,
            requested_at,
            UpdateReservationRequest {
                plate,
                visitor_identity,
                start_time,
                end_time,
                spot_number,
            },
        ) = value;
        Ok(UpdateReservation {
            reservation_id,
            requested_unit,
            plate: Plate::parse(&plate)?,
            visitor_identity: visitor_identity.trim().to_string(),
            start_time,
            end_time,
            spot: spot_number.map(SpotNumber::new),
            requested_at,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignSpotRequest {
    #[garde(range(min = 1))]
    pub spot_number: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservationResponse {
    pub id: ReservationId,
    pub state: ReservationState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedReservationResponse {
    pub state: ReservationState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsResponse {
    pub items: Vec<ReservationResponse>,
}

impl ReservationsResponse {
    pub fn at(reservations: Vec<Reservation>, now: DateTime<Utc>) -> Self {
        Self {
            items: reservations
                .into_iter()
                .map(|r| ReservationResponse::at(r, now))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub plate: String,
    pub visitor_identity: String,
    pub unit_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: ReservationState,
    pub spot_number: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ReservationResponse {
    // 状態は保存値ではなく表示時点の実効状態を返す
    pub fn at(value: Reservation, now: DateTime<Utc>) -> Self {
        let state = value.effective_state(now);
        let Reservation {
            reservation_id,
            plate,
            visitor_identity,
            unit_id,
            window,
            spot,
            created_at,
            ..
        } = value;
        Self {
            reservation_id,
            plate: plate.into(),
            visitor_identity,
            unit_id: unit_id.to_string(),
            start_time: window.start(),
            end_time: window.end(),
            state,
            spot_number: spot.map(SpotNumber::raw),
            created_at,
        }
    }
}
