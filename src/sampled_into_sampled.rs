//! Multi-threaded frame-by-frame analysis of one sampled object into another
//!
//! The orchestrator checks that input and output share their time axis, lets
//! the prototype workspace size the output once, and then runs the frames in
//! contiguous chunks, one cloned workspace per chunk.
//!
//! # Algorithm
//!
//! 1. Partition `0..nx` into chunks of about `frames_per_thread` frames,
//!    at most one chunk per available thread
//! 2. Per chunk: clone the prototype, then for every frame in increasing
//!    order load the input, compute, save, and record the status
//! 3. A failing hook sets the shared abort flag; other workers stop at
//!    their next frame
//! 4. Return the number of frames that reported a non-fatal failure

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::config::ThreadingConfig;
use crate::frame_into_frame::{FramePhase, SampledFrameIntoSampledFrame};
use crate::sampled::{Sampled, SampledFrames};
use crate::status::SampledIntoSampledStatus;
use crate::thread_runner::{run_chunked, ChunkRange};
use crate::{PraatError, Result};

/// Drives a [`SampledFrameIntoSampledFrame`] over all frames of its output
pub struct SampledIntoSampled<'a, T: SampledFrameIntoSampledFrame> {
    input: &'a T::Input,
    output: &'a mut T::Output,
    prototype: T,
    status: &'a mut SampledIntoSampledStatus<T::Status>,
    config: ThreadingConfig,
}

impl<'a, T: SampledFrameIntoSampledFrame> SampledIntoSampled<'a, T> {
    /// Set up an analysis of `input` into `output`
    ///
    /// Fails if the two objects differ in domain or sampling, or if the
    /// status object has the wrong number of records. On success the output
    /// frames have been allocated by the prototype.
    pub fn create(
        input: &'a T::Input,
        output: &'a mut T::Output,
        mut prototype: T,
        status: &'a mut SampledIntoSampledStatus<T::Status>,
        config: ThreadingConfig,
    ) -> Result<Self> {
        let input_domain = input.domain();
        let output_domain = output.domain();
        input_domain.require_equal_domains_and_sampling(&output_domain)?;
        if status.number_of_frames() != output_domain.nx {
            return Err(PraatError::InvalidParameter(format!(
                "status has {} records for {} frames",
                status.number_of_frames(),
                output_domain.nx
            )));
        }

        prototype.allocate_output_frames(input, output)?;
        if output.frames().len() != output_domain.nx {
            return Err(PraatError::InvalidParameter(format!(
                "output has {} frames, expected {}",
                output.frames().len(),
                output_domain.nx
            )));
        }

        Ok(Self {
            input,
            output,
            prototype,
            status,
            config,
        })
    }

    pub fn config(&self) -> &ThreadingConfig {
        &self.config
    }

    pub fn status(&self) -> &SampledIntoSampledStatus<T::Status> {
        self.status
    }

    /// Run the analysis over all frames
    ///
    /// Returns the number of frames whose computation reported a non-fatal
    /// failure. The first fatal error of any worker is returned as
    /// [`PraatError::WorkerFault`]; frames already written stay written.
    pub fn analyse_threaded(&mut self) -> Result<usize> {
        let number_of_frames = self.output.nx();
        let (number_of_threads, chunk_size) = self.config.partition(number_of_frames);
        log::debug!(
            "analysing {} frames with {} thread(s), {} frames per chunk",
            number_of_frames,
            number_of_threads,
            chunk_size
        );

        let abort = AtomicBool::new(false);
        let error_count = AtomicUsize::new(0);
        let update_status = self.config.update_status;
        let input = self.input;
        let prototype = &self.prototype;

        run_chunked(
            self.output.frames_mut(),
            self.status.records_mut(),
            chunk_size,
            number_of_threads,
            &abort,
            |range, frames, records, abort| {
                let errors = analyse_chunk(
                    prototype.clone(),
                    input,
                    range,
                    frames,
                    records,
                    update_status,
                    abort,
                )?;
                error_count.fetch_add(errors, Ordering::Relaxed);
                Ok(())
            },
        )?;

        let errors = error_count.into_inner();
        log::debug!("analysis finished, {} frame(s) with issues", errors);
        Ok(errors)
    }
}

/// Process one chunk on a private workspace; returns its error tally
fn analyse_chunk<T: SampledFrameIntoSampledFrame>(
    mut workspace: T,
    input: &T::Input,
    range: ChunkRange,
    frames: &mut [<T::Output as SampledFrames>::Frame],
    records: &mut [T::Status],
    update_status: bool,
    abort: &AtomicBool,
) -> Result<usize> {
    debug_assert_eq!(frames.len(), range.len());
    workspace.state_mut().start_range(range.first);

    for (offset, (frame, record)) in frames.iter_mut().zip(records.iter_mut()).enumerate() {
        if abort.load(Ordering::Acquire) {
            log::trace!("chunk {} stops at frame {}", range.chunk_index, range.first + offset);
            break;
        }
        let current_frame = range.first + offset;
        debug_assert!(current_frame < range.end);

        if let Err(source) = process_frame(&mut workspace, input, current_frame, frame) {
            abort.store(true, Ordering::Release);
            return Err(PraatError::WorkerFault {
                frame: current_frame,
                source: Box::new(source),
            });
        }
        if update_status {
            *record = workspace.frame_status();
        }
    }
    Ok(workspace.state().frames_error_count)
}

fn process_frame<T: SampledFrameIntoSampledFrame>(
    workspace: &mut T,
    input: &T::Input,
    current_frame: usize,
    frame: &mut <T::Output as SampledFrames>::Frame,
) -> Result<()> {
    {
        let state = workspace.state_mut();
        state.current_frame = current_frame;
        state.frame_analysis_info = Default::default();
    }
    workspace.get_input_frame(input)?;
    workspace.state_mut().advance(FramePhase::InputLoaded);

    let ok = workspace.input_frame_to_output_frame()?;
    let state = workspace.state_mut();
    state.advance(FramePhase::Computed(ok));
    if !ok {
        state.frames_error_count += 1;
    }

    workspace.save_output_frame(frame)?;
    workspace.state_mut().advance(FramePhase::Saved);
    Ok(())
}
