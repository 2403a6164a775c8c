use crate::model::{
    id::{ReservationId, SpotNumber, UnitId},
    plate::Plate,
};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(new, Debug)]
pub struct CreateReservation {
    pub plate: Plate,
    pub visitor_identity: String,
    pub unit_id: UnitId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub spot: Option<SpotNumber>,
    pub requested_at: DateTime<Utc>,
}

#[derive(new, Debug)]
pub struct UpdateReservation {
    pub reservation_id: ReservationId,
    pub requested_unit: UnitId,
    pub plate: Plate,
    pub visitor_identity: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub spot: Option<SpotNumber>,
    pub requested_at: DateTime<Utc>,
}

#[derive(new, Debug)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub requested_unit: UnitId,
}

#[derive(new, Debug)]
pub struct AssignSpot {
    pub reservation_id: ReservationId,
    pub requested_unit: UnitId,
    pub spot: SpotNumber,
    pub requested_at: DateTime<Utc>,
}

#[derive(new, Debug)]
pub struct UnassignSpot {
    pub reservation_id: ReservationId,
    pub requested_unit: UnitId,
}
