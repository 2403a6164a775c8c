use async_trait::async_trait;
use kernel::{
    device::GateActuator,
    model::{access::Authorization, plate::Plate},
};
use shared::error::{AppError, AppResult};
use tokio::process::Command;

/// Opens the gate by running an external command. The plate and the access
/// kind are passed in the `GATE_PLATE` and `GATE_ACCESS_KIND` environment
/// variables.
pub struct CommandGate {
    program: String,
    args: Vec<String>,
}

impl CommandGate {
    /// Splits a command line such as `python3 /opt/gate/open.py` on whitespace.
    pub fn parse(command_line: &str) -> AppResult<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| AppError::ConversionEntityError("gate command is empty".into()))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }
}

#[async_trait]
impl GateActuator for CommandGate {
    async fn open(&self, plate: &Plate, authorization: &Authorization) -> AppResult<()> {
        // タイムアウトで future が破棄された場合はプロセスも止める
        let status = Command::new(&self.program)
            .args(&self.args)
            .env("GATE_PLATE", plate.as_str())
            .env("GATE_ACCESS_KIND", authorization.kind().as_ref())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("gate command: {e}")))?;

        if !status.success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "gate command exited with {status}"
            )));
        }
        Ok(())
    }
}

/// Only logs; used when no gate command is configured.
pub struct DryRunGate;

#[async_trait]
impl GateActuator for DryRunGate {
    async fn open(&self, plate: &Plate, authorization: &Authorization) -> AppResult<()> {
        tracing::info!(
            plate = %plate,
            kind = %authorization.kind(),
            unit_id = %authorization.unit_id(),
            "Dry run: gate would open"
        );
        Ok(())
    }
}
