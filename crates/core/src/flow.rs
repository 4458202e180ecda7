//! The per-request state machine.

use crate::error::AssemblyError;
use std::fmt;
use thiserror::Error;

/// Where a request is in the assembly pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Idle,
    LoadingInputs,
    Validating,
    Merging,
    Mapping,
    Rendering,
    Done,
    Failed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Done | FlowState::Failed)
    }

    /// The state that follows this one on the success path.
    pub fn next(self) -> Option<FlowState> {
        match self {
            FlowState::Idle => Some(FlowState::LoadingInputs),
            FlowState::LoadingInputs => Some(FlowState::Validating),
            FlowState::Validating => Some(FlowState::Merging),
            FlowState::Merging => Some(FlowState::Mapping),
            FlowState::Mapping => Some(FlowState::Rendering),
            FlowState::Rendering => Some(FlowState::Done),
            FlowState::Done | FlowState::Failed => None,
        }
    }

    /// `Failed` is reachable from every non-terminal state; everything else
    /// only moves one step forward.
    pub fn can_transition_to(self, to: FlowState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == FlowState::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::LoadingInputs => "loading inputs",
            FlowState::Validating => "validating",
            FlowState::Merging => "merging",
            FlowState::Mapping => "mapping",
            FlowState::Rendering => "rendering",
            FlowState::Done => "done",
            FlowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters accumulated before a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Non-empty text values mapped so far.
    pub text_replacements: usize,
    pub images_replaced: usize,
}

/// A request that ended in `Failed`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("report assembly failed while {failed_in}: {error}")]
pub struct AssemblyFailure {
    /// The state the request was in when the error happened.
    pub failed_in: FlowState,
    #[source]
    pub error: AssemblyError,
    pub progress: Progress,
    pub transitions: Vec<FlowState>,
}

/// Tracks one request's state and the path it took.
#[derive(Debug)]
pub(crate) struct Flow {
    label: String,
    state: FlowState,
    transitions: Vec<FlowState>,
    pub progress: Progress,
}

impl Flow {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: FlowState::Idle,
            transitions: vec![FlowState::Idle],
            progress: Progress::default(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Moves to the next state on the success path.
    pub fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.enter(next);
        }
    }

    fn enter(&mut self, to: FlowState) {
        debug_assert!(self.state.can_transition_to(to), "{} -> {to}", self.state);
        log::debug!("[{}] {} -> {to}", self.label, self.state);
        self.state = to;
        self.transitions.push(to);
    }

    /// Ends the flow in `Failed`, keeping the counters collected so far.
    pub fn fail(mut self, error: impl Into<AssemblyError>) -> AssemblyFailure {
        let failed_in = self.state;
        let error = error.into();
        log::warn!("[{}] failed while {failed_in}: {error}", self.label);
        self.enter(FlowState::Failed);
        AssemblyFailure {
            failed_in,
            error,
            progress: self.progress,
            transitions: self.transitions,
        }
    }

    pub fn finish(mut self) -> Vec<FlowState> {
        self.enter(FlowState::Done);
        self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path_is_linear() {
        let mut state = FlowState::Idle;
        let mut path = vec![state];
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            state = next;
            path.push(state);
        }
        assert_eq!(
            path,
            vec![
                FlowState::Idle,
                FlowState::LoadingInputs,
                FlowState::Validating,
                FlowState::Merging,
                FlowState::Mapping,
                FlowState::Rendering,
                FlowState::Done
            ]
        );
    }

    #[test]
    fn failed_is_reachable_from_any_live_state() {
        for state in [
            FlowState::Idle,
            FlowState::LoadingInputs,
            FlowState::Validating,
            FlowState::Merging,
            FlowState::Mapping,
            FlowState::Rendering,
        ] {
            assert!(state.can_transition_to(FlowState::Failed));
        }
        assert!(!FlowState::Done.can_transition_to(FlowState::Failed));
        assert!(!FlowState::Validating.can_transition_to(FlowState::Rendering));
    }

    #[test]
    fn failure_keeps_progress_and_path() {
        let mut flow = Flow::start("test");
        flow.advance();
        flow.advance();
        flow.progress.text_replacements = 4;
        let failure = flow.fail(AssemblyError::config_load("x", "y"));
        assert_eq!(failure.failed_in, FlowState::Validating);
        assert_eq!(failure.progress.text_replacements, 4);
        assert_eq!(failure.transitions.last(), Some(&FlowState::Failed));
    }
}
