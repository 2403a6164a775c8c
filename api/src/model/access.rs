use chrono::{DateTime, Utc};
use garde::Validate;
use kernel::model::{
    access::{
        AccessEvent, AccessKind, AccessLink, AccessMethod, AccessOutcome, Authorization,
        DenialReason, EventType,
    },
    id::{AccessEventId, ReservationId, VehicleId},
};
use serde::{Deserialize, Serialize};

// 検出ループ向けのレスポンスは snake_case のまま
#[derive(Debug, Serialize)]
pub struct VerifyPlateResponse {
    pub exists: bool,
    pub valid: bool,
    pub kind: Option<AccessKind>,
    pub reason: Option<&'static str>,
    pub message: String,
    pub unit_id: Option<String>,
    pub reservation_id: Option<ReservationId>,
    pub registered_category: Option<i32>,
}

impl From<AccessOutcome> for VerifyPlateResponse {
    fn from(value: AccessOutcome) -> Self {
        match value {
            AccessOutcome::Authorized(authorization) => {
                let unit_id = Some(authorization.unit_id().to_string());
                let (reservation_id, message) = match &authorization {
                    Authorization::Resident { .. } => (None, "Resident vehicle authorized".into()),
                    Authorization::Visitor { reservation_id, .. } => {
                        (Some(*reservation_id), "Visitor reservation is valid".into())
                    }
                };
                Self {
                    exists: true,
                    valid: true,
                    kind: Some(authorization.kind()),
                    reason: None,
                    message,
                    unit_id,
                    reservation_id,
                    registered_category: None,
                }
            }
            AccessOutcome::Unauthorized(DenialReason::CategoryMismatch { registered }) => Self {
                exists: true,
                valid: false,
                kind: Some(AccessKind::Resident),
                reason: Some("category_mismatch"),
                message: format!(
                    "Plate is registered with vehicle category {registered}, not the detected one"
                ),
                unit_id: None,
                reservation_id: None,
                registered_category: Some(registered.raw()),
            },
            AccessOutcome::Unauthorized(DenialReason::NotFound) => Self {
                exists: false,
                valid: false,
                kind: None,
                reason: Some("not_found"),
                message: "Plate is neither a resident vehicle nor covered by a valid reservation"
                    .into(),
                unit_id: None,
                reservation_id: None,
                registered_category: None,
            },
            AccessOutcome::ResolutionFailed { cause } => Self {
                exists: false,
                valid: false,
                kind: None,
                reason: Some("resolution_failed"),
                message: cause,
                unit_id: None,
                reservation_id: None,
                registered_category: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub method: Option<AccessMethod>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub access_event_id: AccessEventId,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccessHistoryParams {
    #[garde(length(max = 32))]
    pub q: Option<String>,
    #[garde(skip)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEventsResponse {
    pub items: Vec<AccessEventResponse>,
}

impl From<Vec<AccessEvent>> for AccessEventsResponse {
    fn from(value: Vec<AccessEvent>) -> Self {
        Self {
            items: value.into_iter().map(AccessEventResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEventResponse {
    pub access_event_id: AccessEventId,
    pub occurred_at: DateTime<Utc>,
    pub event_type: EventType,
    pub method: AccessMethod,
    pub plate: String,
    pub user_type: AccessKind,
    pub vehicle_id: Option<VehicleId>,
    pub reservation_id: Option<ReservationId>,
}

impl From<AccessEvent> for AccessEventResponse {
    fn from(value: AccessEvent) -> Self {
        let AccessEvent {
            access_event_id,
            occurred_at,
            event_type,
            method,
            detected_plate,
            link,
        } = value;
        let (vehicle_id, reservation_id) = match link {
            AccessLink::Vehicle(id) => (Some(id), None),
            AccessLink::Reservation(id) => (None, Some(id)),
        };
        Self {
            access_event_id,
            occurred_at,
            event_type,
            method,
            plate: detected_plate.into(),
            user_type: link.kind(),
            vehicle_id,
            reservation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::{id::UnitId, vehicle::VehicleCategory};
    use serde_json::json;

    #[test]
    fn verify_response_is_a_tagged_record() {
        let body = serde_json::to_value(VerifyPlateResponse::from(AccessOutcome::Authorized(
            Authorization::Resident {
                unit_id: UnitId::new("101"),
            },
        )))
        .unwrap();
        assert_eq!(body["exists"], json!(true));
        assert_eq!(body["valid"], json!(true));
        assert_eq!(body["kind"], json!("resident"));
        assert_eq!(body["unit_id"], json!("101"));

        let body = serde_json::to_value(VerifyPlateResponse::from(AccessOutcome::Unauthorized(
            DenialReason::CategoryMismatch {
                registered: VehicleCategory::new(1),
            },
        )))
        .unwrap();
        assert_eq!(body["exists"], json!(true));
        assert_eq!(body["valid"], json!(false));
        assert_eq!(body["reason"], json!("category_mismatch"));
        assert_eq!(body["registered_category"], json!(1));

        let body = serde_json::to_value(VerifyPlateResponse::from(AccessOutcome::Unauthorized(
            DenialReason::NotFound,
        )))
        .unwrap();
        assert_eq!(body["exists"], json!(false));
        assert_eq!(body["reason"], json!("not_found"));
    }

    #[test]
    fn visitor_answer_carries_reservation_identity() {
        let reservation_id = ReservationId::new();
        let body = serde_json::to_value(VerifyPlateResponse::from(AccessOutcome::Authorized(
            Authorization::Visitor {
                reservation_id,
                unit_id: UnitId::new("204"),
            },
        )))
        .unwrap();
        assert_eq!(body["kind"], json!("visitor"));
        assert_eq!(body["reservation_id"], json!(reservation_id.to_string()));
    }
}
