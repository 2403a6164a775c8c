//! HTTP client of the access endpoints, used by the gate loop when it runs
//! apart from the database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kernel::{
    model::{
        access::{
            event::{RegisterEntry, RegisterExit},
            AccessKind, AccessMethod, AccessOutcome, Authorization, DenialReason,
        },
        id::{AccessEventId, ReservationId, UnitId},
        plate::Plate,
        vehicle::VehicleCategory,
    },
    repository::access::AccessRepository,
};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use shared::error::{AppError, AppResult};

pub struct RemoteAccessClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RemoteAccessClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::UpstreamUnavailable(format!("access client: {e}")))?;
        let base_url = Url::parse(&base_url.into())
            .map_err(|e| AppError::ConversionEntityError(format!("access api url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConversionEntityError(format!(
                "access api url {base_url} cannot take a path"
            )));
        }
        Ok(Self { client, base_url })
    }

    // ナンバーは OCR の生テキストなので、パス区切りを含んでもエスケープされる
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    async fn post_register(
        &self,
        url: Url,
        plate: &Plate,
        method: AccessMethod,
    ) -> AppResult<AccessEventId> {
        let response = self
            .client
            .post(url)
            .query(&[("method", method.as_ref())])
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("access api: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let body: RegisterBody = response
                .json()
                .await
                .map_err(|e| AppError::UpstreamUnavailable(format!("access api body: {e}")))?;
            return body
                .access_event_id
                .ok_or_else(|| AppError::UpstreamUnavailable(body.message))?
                .parse::<AccessEventId>()
                .map_err(AppError::from);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));
        Err(error_from_status(status, plate, message))
    }
}

#[async_trait]
impl AccessRepository for RemoteAccessClient {
    async fn resolve(
        &self,
        plate: &Plate,
        category: VehicleCategory,
        _now: DateTime<Utc>,
    ) -> AccessOutcome {
        // 判定時刻はサーバー側の現在時刻
        let category = category.to_string();
        let url = self.url(&["verify-plate", plate.as_str(), category.as_str()]);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return AccessOutcome::ResolutionFailed {
                    cause: format!("access api: {e}"),
                }
            }
        };

        let status = response.status();
        match response.json::<VerifyBody>().await {
            Ok(body) => outcome_from_body(body),
            Err(e) => AccessOutcome::ResolutionFailed {
                cause: format!("access api answered HTTP {status}: {e}"),
            },
        }
    }

    async fn register_entry(&self, event: RegisterEntry) -> AppResult<AccessEventId> {
        let endpoint = format!("register-entry-{}", event.kind);
        let url = self.url(&[endpoint.as_str(), event.plate.as_str()]);
        self.post_register(url, &event.plate, event.method).await
    }

    async fn register_exit(&self, event: RegisterExit) -> AppResult<AccessEventId> {
        let url = self.url(&["register-exit", event.plate.as_str()]);
        self.post_register(url, &event.plate, event.method).await
    }
}

#[derive(Debug, Deserialize)]
struct VerifyBody {
    #[serde(default)]
    valid: bool,
    kind: Option<AccessKind>,
    reason: Option<String>,
    #[serde(default)]
    message: String,
    unit_id: Option<String>,
    reservation_id: Option<String>,
    registered_category: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    access_event_id: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn outcome_from_body(body: VerifyBody) -> AccessOutcome {
    let failed = |cause: String| AccessOutcome::ResolutionFailed { cause };

    if body.valid {
        let Some(unit_id) = body.unit_id.map(UnitId::new) else {
            return failed("authorized answer without unit_id".into());
        };
        return match body.kind {
            Some(AccessKind::Resident) => {
                AccessOutcome::Authorized(Authorization::Resident { unit_id })
            }
            Some(AccessKind::Visitor) => match body
                .reservation_id
                .as_deref()
                .map(str::parse::<ReservationId>)
            {
                Some(Ok(reservation_id)) => AccessOutcome::Authorized(Authorization::Visitor {
                    reservation_id,
                    unit_id,
                }),
                _ => failed("visitor answer without a valid reservation_id".into()),
            },
            None => failed("authorized answer without kind".into()),
        };
    }

    match body.reason.as_deref() {
        Some("category_mismatch") => AccessOutcome::Unauthorized(DenialReason::CategoryMismatch {
            registered: VehicleCategory::new(body.registered_category.unwrap_or_default()),
        }),
        Some("not_found") => AccessOutcome::Unauthorized(DenialReason::NotFound),
        _ => failed(body.message),
    }
}

fn error_from_status(status: StatusCode, plate: &Plate, message: String) -> AppError {
    match status {
        StatusCode::CONFLICT => AppError::StaleAuthorization {
            plate: plate.to_string(),
            detail: message,
        },
        StatusCode::NOT_FOUND => AppError::EntityNotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::UnprocessableEntity(message)
        }
        _ => AppError::UpstreamUnavailable(format!("access api answered HTTP {status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(json: &str) -> AccessOutcome {
        outcome_from_body(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn maps_every_verify_answer() {
        assert_eq!(
            outcome(r#"{"exists":true,"valid":true,"kind":"resident","unit_id":"101","message":"ok"}"#),
            AccessOutcome::Authorized(Authorization::Resident {
                unit_id: UnitId::new("101")
            })
        );

        let id = ReservationId::new();
        let body = format!(
            r#"{{"exists":true,"valid":true,"kind":"visitor","unit_id":"204","reservation_id":"{id}","message":"ok"}}"#
        );
        assert_eq!(
            outcome(&body),
            AccessOutcome::Authorized(Authorization::Visitor {
                reservation_id: id,
                unit_id: UnitId::new("204"),
            })
        );

        assert_eq!(
            outcome(r#"{"exists":true,"valid":false,"reason":"category_mismatch","registered_category":1,"message":"x"}"#),
            AccessOutcome::Unauthorized(DenialReason::CategoryMismatch {
                registered: VehicleCategory::new(1)
            })
        );
        assert_eq!(
            outcome(r#"{"exists":false,"valid":false,"reason":"not_found","message":"x"}"#),
            AccessOutcome::Unauthorized(DenialReason::NotFound)
        );
        assert!(matches!(
            outcome(r#"{"exists":false,"valid":false,"reason":"resolution_failed","message":"db down"}"#),
            AccessOutcome::ResolutionFailed { cause } if cause == "db down"
        ));
    }

    #[test]
    fn malformed_authorization_is_not_treated_as_access() {
        assert!(matches!(
            outcome(r#"{"valid":true,"kind":"visitor","unit_id":"204","reservation_id":"nope"}"#),
            AccessOutcome::ResolutionFailed { .. }
        ));
    }

    #[test]
    fn plate_text_is_escaped_into_a_single_path_segment() {
        let client =
            RemoteAccessClient::new("http://gate-api:8080/", Duration::from_secs(1)).unwrap();
        let url = client.url(&["verify-plate", "AB/1?2#", "1"]);
        assert_eq!(
            url.as_str(),
            "http://gate-api:8080/api/v1/verify-plate/AB%2F1%3F2%23/1"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let client =
            RemoteAccessClient::new("http://gate-api:8080/parking", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url(&["register-exit", "ABC123"]).as_str(),
            "http://gate-api:8080/parking/api/v1/register-exit/ABC123"
        );
    }

    #[test]
    fn base_url_must_be_a_web_address() {
        assert!(RemoteAccessClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(RemoteAccessClient::new("mailto:gate@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn conflict_status_becomes_retryable_stale_authorization() {
        let plate = Plate::parse("VIS111").unwrap();
        let err = error_from_status(StatusCode::CONFLICT, &plate, "cancelled".into());
        assert!(err.is_retryable());
        let err = error_from_status(StatusCode::BAD_GATEWAY, &plate, "x".into());
        assert!(err.is_infrastructure());
    }
}
