//! The sequential camera-to-gate loop: sample a frame, detect plates,
//! resolve, register, then actuate the gate.

pub mod backoff;
pub mod category;
pub mod cooldown;
pub mod gate_loop;
pub mod state;

pub use gate_loop::{FrameOutcome, GateLoop, LoopSettings, LoopSummary, PlateOutcome, PlateReport};
