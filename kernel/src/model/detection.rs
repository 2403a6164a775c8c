use chrono::{DateTime, Utc};

/// One sampled camera image, JPEG encoded.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub jpeg: Vec<u8>,
}

/// One plate reported by the detector service for a frame, in the order the
/// service returned them. The category label is whatever the detector
/// emitted (`car`, `auto`, `1`, ...) and is mapped to a vehicle category
/// by the gate loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateCandidate {
    pub plate_text: String,
    pub plate_confidence: f32,
    pub category_label: String,
    pub category_confidence: f32,
}
