use std::{collections::BTreeSet, future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use kernel::{
    device::{FrameSource, GateActuator, PlateDetector},
    model::{
        access::{event::RegisterEntry, AccessMethod, AccessOutcome, DenialReason},
        detection::{Frame, PlateCandidate},
        id::AccessEventId,
        plate::Plate,
        vehicle::VehicleCategory,
    },
    repository::access::AccessRepository,
};
use shared::{
    config::PipelineConfig,
    error::{AppError, AppResult},
};
use tokio::time::{timeout, Instant};

use crate::{
    backoff::Backoff,
    category::CategoryMap,
    cooldown::EntryCooldown,
    state::{FrameEvent, FrameState},
};

// 検出サービスが読み取れなかったときに返すテキスト
const UNREADABLE_PLATE: &str = "No detectada";

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub detector_timeout: Duration,
    pub access_timeout: Duration,
    pub gate_timeout: Duration,
    pub min_plate_confidence: f32,
    pub entry_cooldown: Duration,
    pub categories: CategoryMap,
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &PipelineConfig) -> AppResult<Self> {
        Ok(Self {
            detector_timeout: config.detector_timeout,
            access_timeout: config.access_api_timeout,
            gate_timeout: config.gate_timeout,
            min_plate_confidence: config.min_plate_confidence,
            entry_cooldown: config.entry_cooldown,
            categories: CategoryMap::parse(&config.category_labels)?,
            backoff_initial: config.backoff_initial,
            backoff_max: config.backoff_max,
        })
    }
}

/// What happened to one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    DetectorUnavailable(String),
    NoDetection,
    Checked(Vec<PlateReport>),
}

impl FrameOutcome {
    /// The detector, the data store or the access API failed during this frame.
    pub fn upstream_failed(&self) -> bool {
        match self {
            FrameOutcome::DetectorUnavailable(_) => true,
            FrameOutcome::NoDetection => false,
            FrameOutcome::Checked(reports) => reports.iter().any(|r| {
                matches!(
                    r.outcome,
                    PlateOutcome::ResolutionFailed(_)
                        | PlateOutcome::RegisterFailed {
                            infrastructure: true,
                            ..
                        }
                )
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateReport {
    pub plate_text: String,
    pub outcome: PlateOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlateOutcome {
    Unreadable,
    LowConfidence(f32),
    UnknownCategory(String),
    CoolingDown,
    Denied(DenialReason),
    ResolutionFailed(String),
    RegisterFailed {
        cause: String,
        infrastructure: bool,
    },
    /// The access event is committed. `gate_opened` is false when the gate
    /// command failed or timed out afterwards.
    Admitted {
        access_event_id: AccessEventId,
        gate_opened: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSummary {
    pub frames: u64,
    pub detections: u64,
    pub admitted: u64,
    pub denied: u64,
    pub gate_failures: u64,
    pub detector_failures: u64,
    pub plates_seen: BTreeSet<String>,
}

impl LoopSummary {
    fn record(&mut self, outcome: &FrameOutcome) {
        self.frames += 1;
        match outcome {
            FrameOutcome::DetectorUnavailable(_) => self.detector_failures += 1,
            FrameOutcome::NoDetection => {}
            FrameOutcome::Checked(reports) => {
                for report in reports {
                    self.detections += 1;
                    if report.outcome != PlateOutcome::Unreadable {
                        self.plates_seen.insert(report.plate_text.clone());
                    }
                    match report.outcome {
                        PlateOutcome::Admitted { gate_opened, .. } => {
                            self.admitted += 1;
                            if !gate_opened {
                                self.gate_failures += 1;
                            }
                        }
                        PlateOutcome::Denied(_) => self.denied += 1,
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Processes one frame at a time to completion, so gate actuations happen
/// strictly in frame order.
pub struct GateLoop<S> {
    source: S,
    detector: Arc<dyn PlateDetector>,
    access: Arc<dyn AccessRepository>,
    gate: Arc<dyn GateActuator>,
    settings: LoopSettings,
    state: FrameState,
    cooldown: EntryCooldown,
    backoff: Backoff,
}

impl<S: FrameSource> GateLoop<S> {
    pub fn new(
        source: S,
        detector: Arc<dyn PlateDetector>,
        access: Arc<dyn AccessRepository>,
        gate: Arc<dyn GateActuator>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            source,
            detector,
            access,
            gate,
            cooldown: EntryCooldown::new(settings.entry_cooldown),
            backoff: Backoff::new(settings.backoff_initial, settings.backoff_max),
            settings,
            state: FrameState::Idle,
        }
    }

    /// Runs until the source is exhausted or `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> LoopSummary {
        tokio::pin!(shutdown);
        let mut summary = LoopSummary::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                next = self.source.next_frame() => next,
            };

            let frame = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(error = %e, ?delay, "Frame capture failed");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let outcome = self.process_frame(&frame).await;
            summary.record(&outcome);

            if outcome.upstream_failed() {
                let delay = self.backoff.next_delay();
                tracing::debug!(?delay, "Backing off after upstream failure");
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            } else {
                self.backoff.reset();
            }
        }

        summary
    }

    pub async fn process_frame(&mut self, frame: &Frame) -> FrameOutcome {
        self.advance(FrameEvent::FrameCaptured);

        let candidates = match timeout(self.settings.detector_timeout, self.detector.detect(frame))
            .await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => return self.detector_unavailable(frame, e.to_string()),
            Err(_) => {
                let cause = format!(
                    "no answer within {}ms",
                    self.settings.detector_timeout.as_millis()
                );
                return self.detector_unavailable(frame, cause);
            }
        };

        if candidates.is_empty() {
            self.advance(FrameEvent::NothingToCheck);
            return FrameOutcome::NoDetection;
        }

        let mut reports = Vec::with_capacity(candidates.len());
        let mut checked = BTreeSet::new();
        for candidate in &candidates {
            tracing::info!(
                frame = frame.sequence,
                plate = %candidate.plate_text,
                plate_confidence = candidate.plate_confidence,
                category = %candidate.category_label,
                category_confidence = candidate.category_confidence,
                "Plate detected"
            );
            let outcome = self.check_candidate(candidate, &mut checked).await;
            reports.push(PlateReport {
                plate_text: candidate.plate_text.trim().to_uppercase(),
                outcome,
            });
        }

        // 全候補がスキップされた場合は Detecting のまま残っている
        if self.state == FrameState::Detecting {
            self.advance(FrameEvent::NothingToCheck);
        }
        FrameOutcome::Checked(reports)
    }

    fn detector_unavailable(&mut self, frame: &Frame, cause: String) -> FrameOutcome {
        tracing::warn!(frame = frame.sequence, cause = %cause, "Detector unavailable");
        self.advance(FrameEvent::DetectorFailed);
        FrameOutcome::DetectorUnavailable(cause)
    }

    async fn check_candidate(
        &mut self,
        candidate: &PlateCandidate,
        checked: &mut BTreeSet<Plate>,
    ) -> PlateOutcome {
        let text = candidate.plate_text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case(UNREADABLE_PLATE) {
            return PlateOutcome::Unreadable;
        }
        let Ok(plate) = Plate::parse(text) else {
            return PlateOutcome::Unreadable;
        };
        if candidate.plate_confidence < self.settings.min_plate_confidence {
            return PlateOutcome::LowConfidence(candidate.plate_confidence);
        }
        let Some(category) = self.settings.categories.resolve(&candidate.category_label) else {
            return PlateOutcome::UnknownCategory(candidate.category_label.clone());
        };
        // 同じフレームに同じナンバーが複数あっても一度だけ処理する
        if !checked.insert(plate.clone())
            || self.cooldown.is_cooling_down(&plate, Instant::now())
        {
            return PlateOutcome::CoolingDown;
        }

        self.advance(FrameEvent::CandidateSelected);
        let mut retried = false;
        loop {
            let outcome = self.resolve(&plate, category).await;
            let authorization = match outcome {
                AccessOutcome::Authorized(authorization) => authorization,
                AccessOutcome::Unauthorized(reason) => {
                    tracing::info!(plate = %plate, reason = ?reason, "Access denied");
                    self.advance(FrameEvent::Denied);
                    return PlateOutcome::Denied(reason);
                }
                AccessOutcome::ResolutionFailed { cause } => {
                    tracing::warn!(plate = %plate, cause = %cause, "Could not resolve plate");
                    self.advance(FrameEvent::ResolutionFailed);
                    return PlateOutcome::ResolutionFailed(cause);
                }
            };
            self.advance(FrameEvent::Authorized);

            let entry = RegisterEntry::new(
                authorization.kind(),
                plate.clone(),
                AccessMethod::Automatic,
                Utc::now(),
            );
            let access_event_id = match self.register(entry).await {
                Ok(id) => id,
                Err(e) if e.is_retryable() && !retried => {
                    tracing::info!(plate = %plate, error = %e, "Authorization went stale, resolving again");
                    self.advance(FrameEvent::StaleAuthorization);
                    retried = true;
                    continue;
                }
                Err(e) => {
                    if e.is_infrastructure() {
                        tracing::warn!(plate = %plate, error = %e, "Entry registration failed");
                    } else {
                        tracing::info!(plate = %plate, error = %e, "Entry registration refused");
                    }
                    self.advance(FrameEvent::RegisterFailed);
                    return PlateOutcome::RegisterFailed {
                        cause: e.to_string(),
                        infrastructure: e.is_infrastructure(),
                    };
                }
            };
            self.advance(FrameEvent::Registered);
            self.cooldown.record(plate.clone(), Instant::now());
            tracing::info!(
                plate = %plate,
                kind = %authorization.kind(),
                unit_id = %authorization.unit_id(),
                access_event_id = %access_event_id,
                "Entry registered"
            );

            let gate_opened = match timeout(
                self.settings.gate_timeout,
                self.gate.open(&plate, &authorization),
            )
            .await
            {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::error!(plate = %plate, error = %e, "Gate failed to open");
                    false
                }
                Err(_) => {
                    tracing::error!(plate = %plate, "Gate did not answer in time");
                    false
                }
            };
            self.advance(FrameEvent::GateFinished);

            return PlateOutcome::Admitted {
                access_event_id,
                gate_opened,
            };
        }
    }

    async fn resolve(&self, plate: &Plate, category: VehicleCategory) -> AccessOutcome {
        match timeout(
            self.settings.access_timeout,
            self.access.resolve(plate, category, Utc::now()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => AccessOutcome::ResolutionFailed {
                cause: format!(
                    "access lookup exceeded {}ms",
                    self.settings.access_timeout.as_millis()
                ),
            },
        }
    }

    async fn register(&self, entry: RegisterEntry) -> AppResult<AccessEventId> {
        timeout(self.settings.access_timeout, self.access.register_entry(entry))
            .await
            .map_err(|_| {
                AppError::UpstreamUnavailable(format!(
                    "entry registration exceeded {}ms",
                    self.settings.access_timeout.as_millis()
                ))
            })?
    }

    fn advance(&mut self, event: FrameEvent) {
        self.state = match self.state.next(event) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(error = %e, "Gate loop out of sync, resetting to idle");
                FrameState::Idle
            }
        };
    }
}
