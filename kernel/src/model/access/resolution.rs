use chrono::{DateTime, Utc};
use shared::error::{AppError, AppResult};

use super::{AccessKind, AccessLink, AccessOutcome, Authorization, DenialReason};
use crate::model::{
    plate::Plate,
    reservation::Reservation,
    vehicle::{Vehicle, VehicleCategory},
};

/// Resolve precedence over one snapshot of the data store.
///
/// `resident` is the vehicle registered under the plate regardless of its
/// category, `reservations` are the plate's reservations. The first rule that
/// matches wins:
///
/// 1. resident vehicle with the same category: authorized resident
/// 2. resident vehicle with another category: denied, category mismatch
/// 3. reservation valid at `now`: authorized visitor
/// 4. otherwise: denied, not found
pub fn decide(
    category: VehicleCategory,
    resident: Option<&Vehicle>,
    reservations: &[Reservation],
    now: DateTime<Utc>,
) -> AccessOutcome {
    if let Some(vehicle) = resident {
        if let Some(unit_id) = &vehicle.owning_unit {
            if vehicle.category == category {
                return AccessOutcome::Authorized(Authorization::Resident {
                    unit_id: unit_id.clone(),
                });
            }
            return AccessOutcome::Unauthorized(DenialReason::CategoryMismatch {
                registered: vehicle.category,
            });
        }
    }

    match valid_reservation(reservations, now) {
        Some(reservation) => AccessOutcome::Authorized(Authorization::Visitor {
            reservation_id: reservation.reservation_id,
            unit_id: reservation.unit_id.clone(),
        }),
        None => AccessOutcome::Unauthorized(DenialReason::NotFound),
    }
}

/// Re-checks, inside the registering transaction, that the authorization
/// obtained earlier still holds and returns what the new event links to.
pub fn revalidate(
    kind: AccessKind,
    plate: &Plate,
    resident: Option<&Vehicle>,
    reservations: &[Reservation],
    now: DateTime<Utc>,
) -> AppResult<AccessLink> {
    match kind {
        AccessKind::Resident => resident
            .filter(|v| v.is_resident())
            .map(|v| AccessLink::Vehicle(v.vehicle_id))
            .ok_or_else(|| AppError::StaleAuthorization {
                plate: plate.to_string(),
                detail: "resident vehicle no longer registered".into(),
            }),
        AccessKind::Visitor => valid_reservation(reservations, now)
            .map(|r| AccessLink::Reservation(r.reservation_id))
            .ok_or_else(|| AppError::StaleAuthorization {
                plate: plate.to_string(),
                detail: "no reservation is valid any more".into(),
            }),
    }
}

// 複数該当した場合は開始時刻が最も早いものを使う
fn valid_reservation(reservations: &[Reservation], now: DateTime<Utc>) -> Option<&Reservation> {
    reservations
        .iter()
        .filter(|r| r.is_valid_at(now))
        .min_by_key(|r| r.window.start())
}
