use garde::Validate;
use kernel::model::spot::{Availability, AvailabilitySummary, SpotAvailability, SpotStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOccupancyRequest {
    #[garde(skip)]
    pub occupied: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub spots: Vec<SpotAvailabilityResponse>,
    pub summary: AvailabilitySummaryResponse,
}

impl From<Availability> for AvailabilityResponse {
    fn from(value: Availability) -> Self {
        Self {
            spots: value
                .spots
                .into_iter()
                .map(SpotAvailabilityResponse::from)
                .collect(),
            summary: value.summary.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotAvailabilityResponse {
    pub spot_number: i32,
    pub status: SpotStatus,
    pub status_label: &'static str,
}

impl From<SpotAvailability> for SpotAvailabilityResponse {
    fn from(value: SpotAvailability) -> Self {
        Self {
            spot_number: value.spot.raw(),
            status: value.status,
            status_label: value.status.label(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySummaryResponse {
    pub total: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub available: usize,
}

impl From<AvailabilitySummary> for AvailabilitySummaryResponse {
    fn from(value: AvailabilitySummary) -> Self {
        let AvailabilitySummary {
            total,
            occupied,
            reserved,
            available,
        } = value;
        Self {
            total,
            occupied,
            reserved,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::id::SpotNumber;
    use serde_json::json;

    #[test]
    fn availability_serializes_labels_and_summary() {
        let availability = Availability {
            spots: vec![SpotAvailability {
                spot: SpotNumber::new(3),
                status: SpotStatus::Ocupado,
            }],
            summary: AvailabilitySummary {
                total: 1,
                occupied: 1,
                reserved: 0,
                available: 0,
            },
        };
        let body = serde_json::to_value(AvailabilityResponse::from(availability)).unwrap();
        assert_eq!(
            body,
            json!({
                "spots": [{"spotNumber": 3, "status": "ocupado", "statusLabel": "Ocupado"}],
                "summary": {"total": 1, "occupied": 1, "reserved": 0, "available": 0}
            })
        );
    }
}
