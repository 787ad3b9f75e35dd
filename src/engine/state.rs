//! Workflow State Machine
//!
//! `WorkflowContext` owns the current stage of one workflow run and refuses
//! transitions that the run's mode does not allow.
//!
//! # Stage Flow
//!
//! ```text
//! create:  Init → Detaching → Rebuilding → Reattaching → Done
//! extend:  Init → Discovering → Detaching → Rebuilding → Reattaching → Done
//! remove:  Init → Discovering → Detaching → Done
//!
//! (Any non-terminal stage can transition to Failed)
//! ```
//!
//! Discovery runs before detaching so that an unreadable array is reported
//! before anything on the host is touched.

use crate::types::Mode;
use std::fmt;
use thiserror::Error;

/// Workflow stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    /// Nothing has happened yet
    Init,
    /// Reading the existing array's topology
    Discovering,
    /// Removing devices from the volume group and retiring the old array
    Detaching,
    /// Creating the array over the new member set
    Rebuilding,
    /// Adding the new array back to the volume group
    Reattaching,
    /// Workflow completed (terminal state)
    Done,
    /// Workflow aborted (terminal state)
    Failed,
}

impl WorkflowStage {
    /// Returns true if this is a terminal state (Done or Failed)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if host state may change while in this stage
    #[inline]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Detaching | Self::Rebuilding | Self::Reattaching)
    }

    /// Stages visited by a successful run of `mode`, in order.
    pub const fn path(mode: Mode) -> &'static [Self] {
        match mode {
            Mode::Create => &[
                Self::Init,
                Self::Detaching,
                Self::Rebuilding,
                Self::Reattaching,
                Self::Done,
            ],
            Mode::Extend => &[
                Self::Init,
                Self::Discovering,
                Self::Detaching,
                Self::Rebuilding,
                Self::Reattaching,
                Self::Done,
            ],
            Mode::Remove => &[
                Self::Init,
                Self::Discovering,
                Self::Detaching,
                Self::Done,
            ],
        }
    }

    /// Next stage for `mode`, or None at a terminal state
    pub fn next(self, mode: Mode) -> Option<Self> {
        let path = Self::path(mode);
        path.iter()
            .position(|stage| *stage == self)
            .and_then(|i| path.get(i + 1))
            .copied()
    }

    /// Returns a human-readable description of this stage
    pub const fn description(self) -> &'static str {
        match self {
            Self::Init => "Not started",
            Self::Discovering => "Discovering array topology",
            Self::Detaching => "Detaching from volume group",
            Self::Rebuilding => "Rebuilding array",
            Self::Reattaching => "Reattaching to volume group",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during stage transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    /// Attempted a transition the mode's path does not contain
    #[error("Cannot move from {from} to {to} in {mode} mode")]
    InvalidTransition {
        mode: Mode,
        from: WorkflowStage,
        to: WorkflowStage,
    },

    /// Attempted to transition from a terminal state
    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: WorkflowStage },

    /// Attempted to transition to the same state
    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: WorkflowStage },
}

/// Tracks the stage of a single workflow run.
///
/// # Example
///
/// ```
/// use raidgrow::engine::state::{WorkflowContext, WorkflowStage};
/// use raidgrow::types::Mode;
///
/// let mut ctx = WorkflowContext::new(Mode::Remove);
/// ctx.transition_to(WorkflowStage::Discovering).unwrap();
///
/// // Remove never rebuilds
/// assert!(ctx.transition_to(WorkflowStage::Rebuilding).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    mode: Mode,
    current: WorkflowStage,
    failed_at: Option<WorkflowStage>,
    history: Vec<WorkflowStage>,
}

impl WorkflowContext {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            current: WorkflowStage::Init,
            failed_at: None,
            history: Vec::with_capacity(WorkflowStage::path(mode).len()),
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn current_stage(&self) -> WorkflowStage {
        self.current
    }

    /// Returns the stage at which failure occurred, if any
    #[inline]
    pub fn failed_at(&self) -> Option<WorkflowStage> {
        self.failed_at
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.current == WorkflowStage::Done
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.current == WorkflowStage::Failed
    }

    /// Stages entered so far, in order
    pub fn history(&self) -> &[WorkflowStage] {
        &self.history
    }

    /// Move to `target`, which must be the next stage on this mode's path.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if current is Done or Failed
    /// - `AlreadyAtStage` if target is the current stage
    /// - `InvalidTransition` for anything else off the path (use `fail()` for Failed)
    pub fn transition_to(
        &mut self,
        target: WorkflowStage,
    ) -> Result<WorkflowStage, StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }

        if target == self.current {
            return Err(StageTransitionError::AlreadyAtStage { stage: target });
        }

        if self.current.next(self.mode) != Some(target) {
            return Err(StageTransitionError::InvalidTransition {
                mode: self.mode,
                from: self.current,
                to: target,
            });
        }

        tracing::debug!("stage: {} -> {}", self.current, target);
        self.history.push(target);
        self.current = target;
        Ok(target)
    }

    /// Mark the workflow as failed, recording the stage it failed in.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at Done or Failed
    pub fn fail(&mut self) -> Result<(), StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }

        self.failed_at = Some(self.current);
        self.history.push(WorkflowStage::Failed);
        self.current = WorkflowStage::Failed;
        Ok(())
    }
}

impl From<StageTransitionError> for crate::error::RaidError {
    fn from(err: StageTransitionError) -> Self {
        crate::error::RaidError::StageTransition(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_paths_start_at_init_and_end_at_done() {
        for mode in Mode::iter() {
            let path = WorkflowStage::path(mode);
            assert_eq!(path.first(), Some(&WorkflowStage::Init));
            assert_eq!(path.last(), Some(&WorkflowStage::Done));
            assert!(!path.contains(&WorkflowStage::Failed));
        }
    }

    #[test]
    fn test_remove_skips_rebuild_and_reattach() {
        let path = WorkflowStage::path(Mode::Remove);
        assert!(!path.contains(&WorkflowStage::Rebuilding));
        assert!(!path.contains(&WorkflowStage::Reattaching));
    }

    #[test]
    fn test_create_skips_discovery() {
        assert_eq!(
            WorkflowStage::Init.next(Mode::Create),
            Some(WorkflowStage::Detaching)
        );
        assert_eq!(
            WorkflowStage::Init.next(Mode::Extend),
            Some(WorkflowStage::Discovering)
        );
    }

    #[test]
    fn test_walk_full_path() {
        for mode in Mode::iter() {
            let mut ctx = WorkflowContext::new(mode);
            for stage in &WorkflowStage::path(mode)[1..] {
                ctx.transition_to(*stage).expect("on-path transition");
            }
            assert!(ctx.is_done());
            assert_eq!(ctx.history(), &WorkflowStage::path(mode)[1..]);
        }
    }

    #[test]
    fn test_cannot_skip_stages() {
        let mut ctx = WorkflowContext::new(Mode::Extend);
        let err = ctx.transition_to(WorkflowStage::Detaching).unwrap_err();
        assert!(matches!(err, StageTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cannot_transition_to_same_stage() {
        let mut ctx = WorkflowContext::new(Mode::Create);
        ctx.transition_to(WorkflowStage::Detaching).expect("detaching");
        let err = ctx.transition_to(WorkflowStage::Detaching).unwrap_err();
        assert!(matches!(err, StageTransitionError::AlreadyAtStage { .. }));
    }

    #[test]
    fn test_fail_records_stage_and_is_absorbing() {
        let mut ctx = WorkflowContext::new(Mode::Extend);
        ctx.transition_to(WorkflowStage::Discovering).expect("discovering");
        ctx.transition_to(WorkflowStage::Detaching).expect("detaching");
        ctx.fail().expect("fail");

        assert!(ctx.is_failed());
        assert_eq!(ctx.failed_at(), Some(WorkflowStage::Detaching));
        assert!(matches!(
            ctx.transition_to(WorkflowStage::Rebuilding).unwrap_err(),
            StageTransitionError::FromTerminalState { .. }
        ));
        assert!(ctx.fail().is_err());
    }

    #[test]
    fn test_destructive_stages() {
        assert!(!WorkflowStage::Init.is_destructive());
        assert!(!WorkflowStage::Discovering.is_destructive());
        assert!(WorkflowStage::Detaching.is_destructive());
        assert!(WorkflowStage::Rebuilding.is_destructive());
    }

    #[test]
    fn test_error_display() {
        let err = StageTransitionError::InvalidTransition {
            mode: Mode::Remove,
            from: WorkflowStage::Detaching,
            to: WorkflowStage::Rebuilding,
        };
        let msg = err.to_string();
        assert!(msg.contains("Detaching from volume group"));
        assert!(msg.contains("remove mode"));
    }
}
