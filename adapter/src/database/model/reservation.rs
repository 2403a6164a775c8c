use chrono::{DateTime, Utc};
use kernel::model::{
    id::{ReservationId, SpotNumber, UnitId},
    plate::Plate,
    reservation::{Reservation, ReservationState},
    spot::Booking,
    window::TimeWindow,
};
use shared::error::AppError;

pub const RESERVATION_COLUMNS: &str = r#"
    reservation_id,
    plate,
    visitor_identity,
    unit_id,
    start_time,
    end_time,
    state,
    spot_number,
    created_at
"#;

#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub plate: Plate,
    pub visitor_identity: String,
    pub unit_id: UnitId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: String,
    pub spot_number: Option<SpotNumber>,
    pub created_at: DateTime<Utc>,
}

fn parse_state(state: &str) -> Result<ReservationState, AppError> {
    state
        .parse::<ReservationState>()
        .map_err(|e| AppError::ConversionEntityError(format!("reservation state {state}: {e}")))
}

fn parse_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeWindow, AppError> {
    TimeWindow::new(start, end).map_err(|e| AppError::ConversionEntityError(e.to_string()))
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = AppError;

    fn try_from(value: ReservationRow) -> Result<Self, Self::Error> {
        let ReservationRow {
            reservation_id,
            plate,
            visitor_identity,
            unit_id,
            start_time,
            end_time,
            state,
            spot_number,
            created_at,
        } = value;
        Ok(Reservation {
            reservation_id,
            plate,
            visitor_identity,
            unit_id,
            window: parse_window(start_time, end_time)?,
            state: parse_state(&state)?,
            spot: spot_number,
            created_at,
        })
    }
}

// 駐車枠ごとの予約状況を組み立てるための型
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub reservation_id: ReservationId,
    pub spot_number: SpotNumber,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: String,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            reservation_id: value.reservation_id,
            window: parse_window(value.start_time, value.end_time)?,
            state: parse_state(&value.state)?,
        })
    }
}
