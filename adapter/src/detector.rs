use std::time::Duration;

use async_trait::async_trait;
use kernel::{
    device::PlateDetector,
    model::detection::{Frame, PlateCandidate},
};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use shared::error::{AppError, AppResult};

/// Client of the plate detection service. One JPEG is posted per frame as
/// the multipart part `file`.
pub struct HttpPlateDetector {
    client: reqwest::Client,
    url: String,
}

impl HttpPlateDetector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::UpstreamUnavailable(format!("detector client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PlateDetector for HttpPlateDetector {
    async fn detect(&self, frame: &Frame) -> AppResult<Vec<PlateCandidate>> {
        let part = Part::bytes(frame.jpeg.clone())
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("detector: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "detector answered HTTP {status}"
            )));
        }

        let body: DetectorResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("detector body: {e}")))?;
        Ok(body.into_candidates())
    }
}

#[derive(Debug, Deserialize)]
struct DetectorResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    #[serde(default)]
    plate_text: String,
    #[serde(default)]
    plate_confidence: f32,
    #[serde(default, alias = "vehicle_type")]
    vehicle_category: Option<CategoryLabel>,
    #[serde(default)]
    vehicle_confidence: f32,
}

// 検出サービスは車種を "car" のような文字列でも数値でも返す
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryLabel {
    Number(i64),
    Text(String),
}

impl DetectorResponse {
    fn into_candidates(self) -> Vec<PlateCandidate> {
        self.detections
            .into_iter()
            .map(|d| PlateCandidate {
                plate_text: d.plate_text,
                plate_confidence: d.plate_confidence,
                category_label: match d.vehicle_category {
                    Some(CategoryLabel::Number(n)) => n.to_string(),
                    Some(CategoryLabel::Text(s)) => s,
                    None => String::new(),
                },
                category_confidence: d.vehicle_confidence,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Vec<PlateCandidate> {
        serde_json::from_str::<DetectorResponse>(body)
            .unwrap()
            .into_candidates()
    }

    #[test]
    fn reads_detections_in_order_with_either_label_form() {
        let candidates = parse(
            r#"{"detections": [
                {"plate_text": "ABC123", "plate_confidence": 0.91, "vehicle_type": "car", "vehicle_confidence": 0.88},
                {"plate_text": "VIS111", "plate_confidence": 0.5, "vehicle_category": 2, "vehicle_confidence": 0.7}
            ]}"#,
        );
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].plate_text, "ABC123");
        assert_eq!(candidates[0].category_label, "car");
        assert_eq!(candidates[1].category_label, "2");
        assert!((candidates[1].plate_confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_or_missing_list_means_nothing_detected() {
        assert!(parse(r#"{"detections": []}"#).is_empty());
        assert!(parse(r#"{}"#).is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let candidates = parse(r#"{"detections": [{"plate_text": "No detectada"}]}"#);
        assert_eq!(candidates[0].category_label, "");
        assert_eq!(candidates[0].plate_confidence, 0.0);
    }
}
