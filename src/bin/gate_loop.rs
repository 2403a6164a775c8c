use adapter::{
    access_client::RemoteAccessClient,
    camera::{DirectoryReplaySource, HttpSnapshotSource},
    detector::HttpPlateDetector,
    gate::{CommandGate, DryRunGate},
};
use anyhow::{bail, Result};
use kernel::device::{FrameSource, GateActuator};
use parking_gate::{init_logger, shutdown_signal};
use pipeline::{GateLoop, LoopSettings};
use shared::config::PipelineConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logger()?;

    let config = PipelineConfig::new()?;
    let settings = LoopSettings::from_config(&config)?;

    let detector = Arc::new(HttpPlateDetector::new(
        config.detector_url.clone(),
        config.detector_timeout,
    )?);
    let access = Arc::new(RemoteAccessClient::new(
        config.access_api_url.clone(),
        config.access_api_timeout,
    )?);
    let gate: Arc<dyn GateActuator> = match &config.gate_command {
        Some(command) => Arc::new(CommandGate::parse(command)?),
        None => {
            tracing::warn!("GATE_COMMAND is not set, the gate will not be actuated");
            Arc::new(DryRunGate)
        }
    };

    // 録画フレームの再生が指定されていればカメラより優先する
    match (&config.replay_dir, &config.snapshot_url) {
        (Some(dir), _) => {
            tracing::info!(dir = %dir, "Replaying recorded frames");
            let source = DirectoryReplaySource::open(dir.clone(), config.sample_interval).await?;
            run(GateLoop::new(source, detector, access, gate, settings)).await;
        }
        (None, Some(url)) => {
            tracing::info!(url = %url, "Sampling camera snapshots");
            let source = HttpSnapshotSource::new(
                url.clone(),
                config.sample_interval,
                config.detector_timeout,
            )?;
            run(GateLoop::new(source, detector, access, gate, settings)).await;
        }
        (None, None) => bail!("either SNAPSHOT_URL or REPLAY_DIR must be set"),
    }

    Ok(())
}

async fn run<S: FrameSource>(gate_loop: GateLoop<S>) {
    tracing::info!("Gate loop started");
    let summary = gate_loop.run(shutdown_signal()).await;
    tracing::info!(
        frames = summary.frames,
        detections = summary.detections,
        admitted = summary.admitted,
        denied = summary.denied,
        gate_failures = summary.gate_failures,
        detector_failures = summary.detector_failures,
        plates = ?summary.plates_seen,
        "Gate loop stopped"
    );
}
