use crate::model::{
    id::{ReservationId, SpotNumber, UnitId},
    plate::Plate,
    window::TimeWindow,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub mod conflict;
pub mod event;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Pending,
    Active,
    Expired,
    Cancelled,
}

impl ReservationState {
    /// Stored states that still claim a window on their spot.
    pub fn is_open(self) -> bool {
        matches!(self, ReservationState::Pending | ReservationState::Active)
    }

    /// State observed at `now`. Expiry is never written back; it is derived
    /// from the window on every read.
    pub fn effective(self, window: &TimeWindow, now: DateTime<Utc>) -> Self {
        match self {
            ReservationState::Cancelled | ReservationState::Expired => self,
            ReservationState::Pending | ReservationState::Active => {
                if window.has_ended(now) {
                    ReservationState::Expired
                } else if window.contains(now) {
                    ReservationState::Active
                } else {
                    ReservationState::Pending
                }
            }
        }
    }

    /// State a newly accepted (or edited) reservation is persisted with.
    pub fn on_admission(window: &TimeWindow, now: DateTime<Utc>) -> Self {
        if window.contains(now) {
            ReservationState::Active
        } else {
            ReservationState::Pending
        }
    }
}

/// Pure validity rule: the reservation grants access at `now`.
pub fn is_currently_valid(state: ReservationState, window: &TimeWindow, now: DateTime<Utc>) -> bool {
    state.effective(window, now) == ReservationState::Active
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub plate: Plate,
    pub visitor_identity: String,
    pub unit_id: UnitId,
    pub window: TimeWindow,
    // DB に保存されている状態。期限切れは保存されないので effective_state で判断する
    pub state: ReservationState,
    pub spot: Option<SpotNumber>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn effective_state(&self, now: DateTime<Utc>) -> ReservationState {
        self.state.effective(&self.window, now)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        is_currently_valid(self.state, &self.window, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 19, hour, minute, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(at(10, 0), at(11, 0)).unwrap()
    }

    #[test]
    fn active_reservation_is_valid_only_inside_its_window() {
        let w = window();
        assert!(is_currently_valid(ReservationState::Active, &w, at(10, 30)));
        assert!(!is_currently_valid(ReservationState::Active, &w, at(11, 0)));
        assert!(!is_currently_valid(ReservationState::Active, &w, at(9, 59)));
    }

    #[test]
    fn pending_reservation_becomes_active_when_its_window_opens() {
        let w = window();
        assert_eq!(
            ReservationState::Pending.effective(&w, at(9, 0)),
            ReservationState::Pending
        );
        assert_eq!(
            ReservationState::Pending.effective(&w, at(10, 0)),
            ReservationState::Active
        );
        assert_eq!(
            ReservationState::Pending.effective(&w, at(11, 0)),
            ReservationState::Expired
        );
    }

    #[test]
    fn cancelled_reservation_never_grants_access() {
        let w = window();
        assert_eq!(
            ReservationState::Cancelled.effective(&w, at(10, 30)),
            ReservationState::Cancelled
        );
        assert!(!is_currently_valid(ReservationState::Cancelled, &w, at(10, 30)));
    }

    #[test]
    fn admission_state_depends_on_whether_now_is_inside_the_window() {
        let w = window();
        assert_eq!(ReservationState::on_admission(&w, at(10, 15)), ReservationState::Active);
        assert_eq!(ReservationState::on_admission(&w, at(8, 0)), ReservationState::Pending);
    }

    #[test]
    fn state_names_round_trip_through_storage_strings() {
        assert_eq!(ReservationState::Cancelled.as_ref(), "cancelled");
        assert_eq!("pending".parse::<ReservationState>().ok(), Some(ReservationState::Pending));
    }
}
