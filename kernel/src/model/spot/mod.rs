use crate::model::{
    id::{ReservationId, SpotNumber},
    reservation::ReservationState,
    window::TimeWindow,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display};

pub mod event;

/// One reservation claiming a window on a spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub reservation_id: ReservationId,
    pub window: TimeWindow,
    pub state: ReservationState,
}

/// Everything the conflict checker needs to know about one spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotSchedule {
    pub spot: SpotNumber,
    // 物理センサーの在車フラグ、または出庫記録のない入庫
    pub occupied: bool,
    pub bookings: Vec<Booking>,
}

impl SpotSchedule {
    pub fn is_reserved_at(&self, now: DateTime<Utc>) -> bool {
        self.bookings
            .iter()
            .any(|b| b.state.effective(&b.window, now) == ReservationState::Active)
    }

    /// Rendering precedence: occupied over reserved over free.
    pub fn status_at(&self, now: DateTime<Utc>) -> SpotStatus {
        if self.occupied {
            SpotStatus::Ocupado
        } else if self.is_reserved_at(now) {
            SpotStatus::Reservado
        } else {
            SpotStatus::Libre
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Libre,
    Ocupado,
    Reservado,
}

impl SpotStatus {
    pub fn label(self) -> &'static str {
        match self {
            SpotStatus::Libre => "Libre",
            SpotStatus::Ocupado => "Ocupado",
            SpotStatus::Reservado => "Reservado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotAvailability {
    pub spot: SpotNumber,
    pub status: SpotStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilitySummary {
    pub total: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub spots: Vec<SpotAvailability>,
    pub summary: AvailabilitySummary,
}

impl Availability {
    pub fn from_schedules(schedules: &[SpotSchedule], now: DateTime<Utc>) -> Self {
        let mut spots: Vec<SpotAvailability> = schedules
            .iter()
            .map(|s| SpotAvailability {
                spot: s.spot,
                status: s.status_at(now),
            })
            .collect();
        spots.sort_by_key(|s| s.spot);

        let total = spots.len();
        let occupied = spots
            .iter()
            .filter(|s| s.status == SpotStatus::Ocupado)
            .count();
        let reserved = spots
            .iter()
            .filter(|s| s.status == SpotStatus::Reservado)
            .count();

        Self {
            spots,
            summary: AvailabilitySummary {
                total,
                occupied,
                reserved,
                available: total.saturating_sub(occupied + reserved),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 19, hour, 0, 0).unwrap()
    }

    fn schedule(number: i32, occupied: bool, bookings: Vec<Booking>) -> SpotSchedule {
        SpotSchedule {
            spot: SpotNumber::new(number),
            occupied,
            bookings,
        }
    }

    fn booking(start: u32, end: u32, state: ReservationState) -> Booking {
        Booking {
            reservation_id: ReservationId::new(),
            window: TimeWindow::new(at(start), at(end)).unwrap(),
            state,
        }
    }

    #[test]
    fn occupied_wins_over_reserved() {
        let spot = schedule(1, true, vec![booking(10, 12, ReservationState::Active)]);
        assert_eq!(spot.status_at(at(11)), SpotStatus::Ocupado);
    }

    #[test]
    fn pending_booking_reserves_the_spot_once_its_window_opens() {
        let spot = schedule(2, false, vec![booking(10, 12, ReservationState::Pending)]);
        assert_eq!(spot.status_at(at(9)), SpotStatus::Libre);
        assert_eq!(spot.status_at(at(10)), SpotStatus::Reservado);
        assert_eq!(spot.status_at(at(12)), SpotStatus::Libre);
    }

    #[test]
    fn cancelled_booking_leaves_the_spot_free() {
        let spot = schedule(3, false, vec![booking(10, 12, ReservationState::Cancelled)]);
        assert_eq!(spot.status_at(at(11)), SpotStatus::Libre);
    }

    #[test]
    fn summary_counts_each_spot_once_in_sorted_order() {
        let schedules = vec![
            schedule(3, false, vec![]),
            schedule(1, true, vec![booking(10, 12, ReservationState::Active)]),
            schedule(2, false, vec![booking(10, 12, ReservationState::Active)]),
        ];
        let availability = Availability::from_schedules(&schedules, at(11));

        let numbers: Vec<i32> = availability.spots.iter().map(|s| s.spot.raw()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(
            availability.summary,
            AvailabilitySummary {
                total: 3,
                occupied: 1,
                reserved: 1,
                available: 1,
            }
        );
    }
}
