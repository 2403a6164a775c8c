use thiserror::Error;

/// Where the loop currently is with the frame (and plate) in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    #[default]
    Idle,
    Detecting,
    Resolving,
    Registering,
    Actuating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    FrameCaptured,
    DetectorFailed,
    NothingToCheck,
    CandidateSelected,
    Authorized,
    Denied,
    ResolutionFailed,
    Registered,
    StaleAuthorization,
    RegisterFailed,
    GateFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event:?} is not accepted while {state:?}")]
pub struct InvalidTransition {
    pub state: FrameState,
    pub event: FrameEvent,
}

impl FrameState {
    pub fn next(self, event: FrameEvent) -> Result<FrameState, InvalidTransition> {
        use FrameEvent as E;
        use FrameState as S;

        let next = match (self, event) {
            (S::Idle, E::FrameCaptured) => S::Detecting,
            (S::Detecting, E::DetectorFailed | E::NothingToCheck) => S::Idle,
            // Idle も同じフレームの次の候補を受け付ける
            (S::Detecting | S::Idle, E::CandidateSelected) => S::Resolving,
            (S::Resolving, E::Authorized) => S::Registering,
            (S::Resolving, E::Denied | E::ResolutionFailed) => S::Idle,
            (S::Registering, E::Registered) => S::Actuating,
            (S::Registering, E::StaleAuthorization) => S::Resolving,
            (S::Registering, E::RegisterFailed) => S::Idle,
            // ゲートの失敗でも記録済みのイベントは取り消さない
            (S::Actuating, E::GateFinished) => S::Idle,
            (state, event) => return Err(InvalidTransition { state, event }),
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(events: &[FrameEvent]) -> Result<FrameState, InvalidTransition> {
        events
            .iter()
            .try_fold(FrameState::Idle, |state, event| state.next(*event))
    }

    #[test]
    fn authorized_plate_walks_the_whole_cycle() {
        use FrameEvent::*;
        assert_eq!(
            walk(&[FrameCaptured, CandidateSelected, Authorized, Registered, GateFinished]),
            Ok(FrameState::Idle)
        );
    }

    #[test]
    fn stale_authorization_goes_back_to_resolving() {
        use FrameEvent::*;
        assert_eq!(
            walk(&[FrameCaptured, CandidateSelected, Authorized, StaleAuthorization]),
            Ok(FrameState::Resolving)
        );
    }

    #[test]
    fn failures_return_to_idle() {
        use FrameEvent::*;
        assert_eq!(walk(&[FrameCaptured, DetectorFailed]), Ok(FrameState::Idle));
        assert_eq!(
            walk(&[FrameCaptured, CandidateSelected, ResolutionFailed]),
            Ok(FrameState::Idle)
        );
        assert_eq!(
            walk(&[FrameCaptured, CandidateSelected, Authorized, RegisterFailed]),
            Ok(FrameState::Idle)
        );
    }

    #[test]
    fn gate_cannot_open_before_registration() {
        let err = FrameState::Resolving.next(FrameEvent::Registered).unwrap_err();
        assert_eq!(err.state, FrameState::Resolving);
        assert!(FrameState::Idle.next(FrameEvent::GateFinished).is_err());
        assert!(FrameState::Detecting.next(FrameEvent::Authorized).is_err());
    }
}
