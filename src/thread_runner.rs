//! Static chunked execution of frame ranges on a rayon thread pool
//!
//! The frames and their status records are cut into contiguous chunks of
//! equal size (the last one may be shorter) before any work starts. Each
//! chunk is handed to the worker closure together with the mutable
//! sub-slices it owns, so two workers can never touch the same frame.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::Result;

/// The frame range handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Position of the chunk in the partition; rayon picks the thread
    pub chunk_index: usize,
    /// First frame of the chunk (0-based, inclusive)
    pub first: usize,
    /// One past the last frame of the chunk
    pub end: usize,
}

impl ChunkRange {
    pub fn len(&self) -> usize {
        self.end - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.first
    }
}

/// Run `worker` over all chunks of `frames` and `records`
///
/// With `number_of_threads <= 1` everything runs on the calling thread.
/// `abort` is shared with the workers; a worker that fails is expected to
/// set it. Returns the first error reported by any worker.
pub fn run_chunked<F, S, W>(
    frames: &mut [F],
    records: &mut [S],
    chunk_size: usize,
    number_of_threads: usize,
    abort: &AtomicBool,
    worker: W,
) -> Result<()>
where
    F: Send,
    S: Send,
    W: Fn(ChunkRange, &mut [F], &mut [S], &AtomicBool) -> Result<()> + Sync,
{
    debug_assert_eq!(frames.len(), records.len());
    if frames.is_empty() {
        return Ok(());
    }
    let chunk_size = chunk_size.max(1);
    let run_one = |(chunk_index, (frame_chunk, record_chunk)): (usize, (&mut [F], &mut [S]))| {
        if abort.load(Ordering::Acquire) {
            return Ok(());
        }
        let first = chunk_index * chunk_size;
        let range = ChunkRange {
            chunk_index,
            first,
            end: first + frame_chunk.len(),
        };
        log::trace!(
            "chunk {} covers frames {}..{}",
            range.chunk_index,
            range.first,
            range.end
        );
        worker(range, frame_chunk, record_chunk, abort)
    };

    if number_of_threads <= 1 {
        return frames
            .chunks_mut(chunk_size)
            .zip(records.chunks_mut(chunk_size))
            .enumerate()
            .try_for_each(run_one);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(number_of_threads)
        .build()?;
    pool.install(|| {
        frames
            .par_chunks_mut(chunk_size)
            .zip(records.par_chunks_mut(chunk_size))
            .enumerate()
            .try_for_each(run_one)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PraatError;

    #[test]
    fn test_all_chunks_visited() {
        let mut frames = vec![0usize; 103];
        let mut records = vec![0usize; 103];
        let abort = AtomicBool::new(false);
        run_chunked(&mut frames, &mut records, 10, 4, &abort, |range, f, r, _| {
            for (offset, (frame, record)) in f.iter_mut().zip(r.iter_mut()).enumerate() {
                *frame = range.first + offset;
                *record = range.chunk_index;
            }
            Ok(())
        })
        .unwrap();
        assert!(frames.iter().enumerate().all(|(i, &f)| f == i));
        assert_eq!(records[0], 0);
        assert_eq!(records[102], 10);
    }

    #[test]
    fn test_error_sets_abort() {
        let mut frames = vec![0u8; 50];
        let mut records = vec![(); 50];
        let abort = AtomicBool::new(false);
        let result = run_chunked(&mut frames, &mut records, 5, 1, &abort, |range, _, _, abort| {
            if range.chunk_index == 2 {
                abort.store(true, Ordering::Release);
                return Err(PraatError::Analysis("stop".to_string()));
            }
            Ok(())
        });
        assert!(result.is_err());
        assert!(abort.load(Ordering::Acquire));
    }
}
