//! The per-frame transform contract
//!
//! An analysis that maps frame `i` of an input object onto frame `i` of an
//! output object implements [`SampledFrameIntoSampledFrame`]. One instance is
//! the workspace of one worker: it owns all numeric buffers it needs, and the
//! orchestrator gives every worker its own clone of a prototype.
//!
//! For every frame the orchestrator drives the workspace through
//! `Idle -> InputLoaded -> Computed -> Saved`:
//!
//! 1. [`get_input_frame`](SampledFrameIntoSampledFrame::get_input_frame) copies the
//!    input data of `current_frame` into the workspace
//! 2. [`input_frame_to_output_frame`](SampledFrameIntoSampledFrame::input_frame_to_output_frame)
//!    computes the result on internal buffers only
//! 3. [`save_output_frame`](SampledFrameIntoSampledFrame::save_output_frame) writes the
//!    result into the output slot of `current_frame`

use crate::sampled::{Sampled, SampledFrames};
use crate::status::{FrameAnalysisInfo, FrameStatus};
use crate::Result;

/// Where a workspace is in the processing of its current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    #[default]
    Idle,
    InputLoaded,
    /// The computation finished; `false` means a non-fatal failure
    Computed(bool),
    Saved,
}

impl FramePhase {
    fn can_advance_to(self, next: FramePhase) -> bool {
        matches!(
            (self, next),
            (FramePhase::Idle, FramePhase::InputLoaded)
                | (FramePhase::Saved, FramePhase::InputLoaded)
                | (FramePhase::InputLoaded, FramePhase::Computed(_))
                | (FramePhase::Computed(_), FramePhase::Saved)
        )
    }
}

/// Bookkeeping shared by all workspaces
#[derive(Debug, Clone, Default)]
pub struct FrameIntoFrameState {
    /// First frame of the range owned by this workspace
    pub start_frame: usize,
    /// Frame currently being processed (0-based, global index)
    pub current_frame: usize,
    /// Diagnostic of the current frame
    pub frame_analysis_info: FrameAnalysisInfo,
    /// Number of frames of this workspace that reported a failure
    pub frames_error_count: usize,
    pub phase: FramePhase,
}

impl FrameIntoFrameState {
    /// Reset the bookkeeping for a new range starting at `start_frame`
    pub fn start_range(&mut self, start_frame: usize) {
        self.start_frame = start_frame;
        self.current_frame = start_frame;
        self.frame_analysis_info = FrameAnalysisInfo::Ok;
        self.frames_error_count = 0;
        self.phase = FramePhase::Idle;
    }

    /// Move to the next phase of the per-frame cycle
    pub fn advance(&mut self, next: FramePhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid frame phase transition {:?} -> {:?} at frame {}",
            self.phase,
            next,
            self.current_frame
        );
        self.phase = next;
    }
}

/// Transform of one input frame into one output frame
///
/// Implementations must be cheap to clone relative to the work per chunk and
/// every clone must own independent buffers.
pub trait SampledFrameIntoSampledFrame: Clone + Send + Sync {
    type Input: Sampled + Sync;
    type Output: SampledFrames;
    type Status: FrameStatus;

    /// Size every output frame and the workspace buffers
    ///
    /// Called once, on a single thread, before any frame is processed.
    /// Output storage must not be reallocated afterwards.
    fn allocate_output_frames(&mut self, input: &Self::Input, output: &mut Self::Output)
        -> Result<()>;

    /// Load the input data of `state().current_frame`
    fn get_input_frame(&mut self, input: &Self::Input) -> Result<()>;

    /// Compute the output of the current frame on internal buffers
    ///
    /// Returns `Ok(false)` for a non-fatal failure, in which case
    /// `state().frame_analysis_info` says what went wrong.
    fn input_frame_to_output_frame(&mut self) -> Result<bool>;

    /// Write the result into the output slot of the current frame
    fn save_output_frame(
        &mut self,
        frame: &mut <Self::Output as SampledFrames>::Frame,
    ) -> Result<()>;

    /// Status record of the current frame
    fn frame_status(&self) -> Self::Status;

    fn state(&self) -> &FrameIntoFrameState;

    fn state_mut(&mut self) -> &mut FrameIntoFrameState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        let mut state = FrameIntoFrameState::default();
        state.start_range(3);
        assert_eq!(state.current_frame, 3);
        state.advance(FramePhase::InputLoaded);
        state.advance(FramePhase::Computed(true));
        state.advance(FramePhase::Saved);
        state.current_frame += 1;
        state.advance(FramePhase::InputLoaded);
        assert_eq!(state.phase, FramePhase::InputLoaded);
    }

    #[test]
    fn test_phase_transitions() {
        assert!(FramePhase::Idle.can_advance_to(FramePhase::InputLoaded));
        assert!(FramePhase::Computed(false).can_advance_to(FramePhase::Saved));
        assert!(!FramePhase::Idle.can_advance_to(FramePhase::Saved));
        assert!(!FramePhase::InputLoaded.can_advance_to(FramePhase::Saved));
    }
}
