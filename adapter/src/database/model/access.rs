use chrono::{DateTime, Utc};
use kernel::model::{
    access::{AccessEvent, AccessLink, AccessMethod, EventType},
    id::{AccessEventId, ReservationId, VehicleId},
    plate::Plate,
};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct AccessEventRow {
    pub access_event_id: AccessEventId,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
    pub method: String,
    pub detected_plate: Plate,
    pub vehicle_id: Option<VehicleId>,
    pub reservation_id: Option<ReservationId>,
}

impl TryFrom<AccessEventRow> for AccessEvent {
    type Error = AppError;

    fn try_from(value: AccessEventRow) -> Result<Self, Self::Error> {
        let AccessEventRow {
            access_event_id,
            occurred_at,
            event_type,
            method,
            detected_plate,
            vehicle_id,
            reservation_id,
        } = value;
        let link = match (vehicle_id, reservation_id) {
            (Some(vehicle_id), None) => AccessLink::Vehicle(vehicle_id),
            (None, Some(reservation_id)) => AccessLink::Reservation(reservation_id),
            _ => {
                return Err(AppError::ConversionEntityError(format!(
                    "access event {access_event_id} must link exactly one vehicle or reservation"
                )))
            }
        };
        Ok(AccessEvent {
            access_event_id,
            occurred_at,
            event_type: event_type
                .parse::<EventType>()
                .map_err(|e| AppError::ConversionEntityError(e.to_string()))?,
            method: method
                .parse::<AccessMethod>()
                .map_err(|e| AppError::ConversionEntityError(e.to_string()))?,
            detected_plate,
            link,
        })
    }
}

// access_events に書き込む際の列の値
pub struct AccessLinkColumns {
    pub vehicle_id: Option<VehicleId>,
    pub reservation_id: Option<ReservationId>,
}

impl From<AccessLink> for AccessLinkColumns {
    fn from(value: AccessLink) -> Self {
        match value {
            AccessLink::Vehicle(vehicle_id) => Self {
                vehicle_id: Some(vehicle_id),
                reservation_id: None,
            },
            AccessLink::Reservation(reservation_id) => Self {
                vehicle_id: None,
                reservation_id: Some(reservation_id),
            },
        }
    }
}
