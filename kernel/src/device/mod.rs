//! Devices the gate loop talks to. Each call may block on I/O, so the loop
//! wraps them in timeouts.

use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    access::Authorization,
    detection::{Frame, PlateCandidate},
    plate::Plate,
};

#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next sampled frame. `Ok(None)` means the source is
    /// exhausted and the loop should stop.
    async fn next_frame(&mut self) -> AppResult<Option<Frame>>;
}

#[async_trait]
pub trait PlateDetector: Send + Sync {
    /// An empty list is a valid "nothing detected" answer.
    async fn detect(&self, frame: &Frame) -> AppResult<Vec<PlateCandidate>>;
}

#[async_trait]
pub trait GateActuator: Send + Sync {
    async fn open(&self, plate: &Plate, authorization: &Authorization) -> AppResult<()>;
}
