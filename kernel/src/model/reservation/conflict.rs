use chrono::{DateTime, Utc};
use shared::error::AppError;
use thiserror::Error;

use super::ReservationState;
use crate::model::{
    id::{ReservationId, SpotNumber},
    plate::Plate,
    spot::SpotSchedule,
    window::TimeWindow,
};

/// Business-rule violations raised while admitting a reservation.
/// Variants are listed in the order the rules are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationConflict {
    #[error("the reservation window must end after it starts and must not be over already")]
    InvalidWindow,
    #[error("visitor vehicle {0} is not registered")]
    UnknownVisitorVehicle(Plate),
    #[error("spot {spot} already has reservation {existing} overlapping the requested window")]
    OverlapConflict {
        spot: SpotNumber,
        existing: ReservationId,
    },
    #[error("spot {0} is occupied and the requested window includes the present")]
    CurrentlyOccupiedConflict(SpotNumber),
}

impl From<ReservationConflict> for AppError {
    fn from(value: ReservationConflict) -> Self {
        match value {
            ReservationConflict::InvalidWindow => AppError::InvalidWindow,
            ReservationConflict::UnknownVisitorVehicle(plate) => {
                AppError::UnknownVisitorVehicle(plate.into())
            }
            ReservationConflict::OverlapConflict { spot, .. } => {
                AppError::OverlapConflict(spot.raw())
            }
            ReservationConflict::CurrentlyOccupiedConflict(spot) => {
                AppError::CurrentlyOccupiedConflict(spot.raw())
            }
        }
    }
}

/// A reservation as it would be stored, checked against a consistent
/// snapshot of its spot. The repository builds this inside the same
/// transaction that writes the row.
#[derive(Debug)]
pub struct ReservationCandidate<'a> {
    pub plate: &'a Plate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub visitor_registered: bool,
    pub spot: Option<&'a SpotSchedule>,
    /// The reservation being edited; its own booking never conflicts with itself.
    pub excluding: Option<ReservationId>,
}

/// Accepted window and the state to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub window: TimeWindow,
    pub state: ReservationState,
}

impl ReservationCandidate<'_> {
    pub fn check(&self, now: DateTime<Utc>) -> Result<Admission, ReservationConflict> {
        let window = TimeWindow::new(self.start_time, self.end_time)?;
        if window.has_ended(now) {
            return Err(ReservationConflict::InvalidWindow);
        }

        if !self.visitor_registered {
            return Err(ReservationConflict::UnknownVisitorVehicle(self.plate.clone()));
        }

        if let Some(schedule) = self.spot {
            let clash = schedule
                .bookings
                .iter()
                .filter(|b| Some(b.reservation_id) != self.excluding)
                .filter(|b| b.state.is_open())
                .find(|b| b.window.overlaps(&window));
            if let Some(existing) = clash {
                return Err(ReservationConflict::OverlapConflict {
                    spot: schedule.spot,
                    existing: existing.reservation_id,
                });
            }

            if schedule.occupied && window.contains(now) {
                return Err(ReservationConflict::CurrentlyOccupiedConflict(schedule.spot));
            }
        }

        Ok(Admission {
            window,
            state: ReservationState::on_admission(&window, now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::spot::Booking;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 19, hour, minute, 0).unwrap()
    }

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).unwrap()
    }

    fn booking(start: DateTime<Utc>, end: DateTime<Utc>, state: ReservationState) -> Booking {
        Booking {
            reservation_id: ReservationId::new(),
            window: TimeWindow::new(start, end).unwrap(),
            state,
        }
    }

    fn candidate<'a>(
        plate: &'a Plate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        spot: Option<&'a SpotSchedule>,
    ) -> ReservationCandidate<'a> {
        ReservationCandidate {
            plate,
            start_time: start,
            end_time: end,
            visitor_registered: true,
            spot,
            excluding: None,
        }
    }

    #[test]
    fn back_to_back_reservation_is_accepted_but_nested_one_is_not() {
        let spot = SpotSchedule {
            spot: SpotNumber::new(5),
            occupied: false,
            bookings: vec![booking(at(10, 0), at(11, 0), ReservationState::Active)],
        };
        let p = plate("VIS222");
        let now = at(9, 0);

        let adjacent = candidate(&p, at(11, 0), at(12, 0), Some(&spot)).check(now);
        assert_eq!(adjacent.map(|a| a.state), Ok(ReservationState::Pending));

        let nested = candidate(&p, at(10, 30), at(10, 45), Some(&spot)).check(now);
        assert!(matches!(
            nested,
            Err(ReservationConflict::OverlapConflict { spot, .. }) if spot == SpotNumber::new(5)
        ));
    }

    #[test]
    fn occupied_spot_only_blocks_windows_covering_now() {
        let now = at(14, 0);
        let spot = SpotSchedule {
            spot: SpotNumber::new(3),
            occupied: true,
            bookings: vec![],
        };
        let p = plate("VIS333");

        let immediate = candidate(&p, now, now + Duration::hours(1), Some(&spot)).check(now);
        assert_eq!(
            immediate,
            Err(ReservationConflict::CurrentlyOccupiedConflict(SpotNumber::new(3)))
        );

        let later = candidate(
            &p,
            now + Duration::hours(2),
            now + Duration::hours(3),
            Some(&spot),
        )
        .check(now);
        assert_eq!(later.map(|a| a.state), Ok(ReservationState::Pending));
    }

    #[test]
    fn rules_are_evaluated_in_order() {
        let p = plate("VIS444");
        let spot = SpotSchedule {
            spot: SpotNumber::new(1),
            occupied: true,
            bookings: vec![booking(at(10, 0), at(11, 0), ReservationState::Pending)],
        };

        let mut inverted = candidate(&p, at(11, 0), at(10, 0), Some(&spot));
        inverted.visitor_registered = false;
        assert_eq!(inverted.check(at(9, 0)), Err(ReservationConflict::InvalidWindow));

        let mut unknown = candidate(&p, at(10, 0), at(11, 0), Some(&spot));
        unknown.visitor_registered = false;
        assert_eq!(
            unknown.check(at(10, 30)),
            Err(ReservationConflict::UnknownVisitorVehicle(p.clone()))
        );

        // 重なりと在車の両方に該当する場合は重なりが先
        let both = candidate(&p, at(10, 0), at(11, 0), Some(&spot)).check(at(10, 30));
        assert!(matches!(both, Err(ReservationConflict::OverlapConflict { .. })));
    }

    #[test]
    fn cancelled_and_edited_bookings_do_not_conflict() {
        let own = booking(at(10, 0), at(11, 0), ReservationState::Active);
        let spot = SpotSchedule {
            spot: SpotNumber::new(7),
            occupied: false,
            bookings: vec![
                own.clone(),
                booking(at(10, 0), at(11, 0), ReservationState::Cancelled),
            ],
        };
        let p = plate("VIS555");

        let mut edit = candidate(&p, at(10, 15), at(11, 15), Some(&spot));
        edit.excluding = Some(own.reservation_id);
        assert_eq!(
            edit.check(at(10, 20)).map(|a| a.state),
            Ok(ReservationState::Active)
        );
    }

    #[test]
    fn window_that_already_ended_is_rejected() {
        let p = plate("VIS666");
        assert_eq!(
            candidate(&p, at(8, 0), at(9, 0), None).check(at(9, 0)),
            Err(ReservationConflict::InvalidWindow)
        );
    }

    #[test]
    fn reservation_without_spot_skips_spot_rules() {
        let p = plate("VIS777");
        let admission = candidate(&p, at(10, 0), at(11, 0), None)
            .check(at(10, 0))
            .unwrap();
        assert_eq!(admission.state, ReservationState::Active);
        assert_eq!(admission.window.start(), at(10, 0));
    }

    #[test]
    fn conflicts_map_onto_the_error_taxonomy() {
        let err: AppError = ReservationConflict::CurrentlyOccupiedConflict(SpotNumber::new(3)).into();
        assert!(matches!(err, AppError::CurrentlyOccupiedConflict(3)));
        let err: AppError = ReservationConflict::UnknownVisitorVehicle(plate("VIS111")).into();
        assert!(matches!(err, AppError::UnknownVisitorVehicle(p) if p == "VIS111"));
    }
}
