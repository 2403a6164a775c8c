use crate::model::{
    id::{AccessEventId, ReservationId, UnitId, VehicleId},
    plate::Plate,
    vehicle::VehicleCategory,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub mod event;
pub mod resolution;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Resident,
    Visitor,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Entry,
    Exit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessMethod {
    Automatic,
    Manual,
}

/// An access event points at exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLink {
    Vehicle(VehicleId),
    Reservation(ReservationId),
}

impl AccessLink {
    pub fn kind(&self) -> AccessKind {
        match self {
            AccessLink::Vehicle(_) => AccessKind::Resident,
            AccessLink::Reservation(_) => AccessKind::Visitor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub access_event_id: AccessEventId,
    pub occurred_at: DateTime<Utc>,
    pub event_type: EventType,
    pub method: AccessMethod,
    pub detected_plate: Plate,
    pub link: AccessLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Resident {
        unit_id: UnitId,
    },
    Visitor {
        reservation_id: ReservationId,
        unit_id: UnitId,
    },
}

impl Authorization {
    pub fn kind(&self) -> AccessKind {
        match self {
            Authorization::Resident { .. } => AccessKind::Resident,
            Authorization::Visitor { .. } => AccessKind::Visitor,
        }
    }

    pub fn unit_id(&self) -> &UnitId {
        match self {
            Authorization::Resident { unit_id } | Authorization::Visitor { unit_id, .. } => unit_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NotFound,
    /// The plate belongs to a resident vehicle of another category.
    CategoryMismatch { registered: VehicleCategory },
}

/// Result of resolving a detected plate. Data-store failures are a separate
/// variant so that "denied" is never confused with "could not determine".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Authorized(Authorization),
    Unauthorized(DenialReason),
    ResolutionFailed { cause: String },
}

impl AccessOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AccessOutcome::Authorized(_))
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        match self {
            AccessOutcome::Authorized(authorization) => Some(authorization),
            _ => None,
        }
    }
}
