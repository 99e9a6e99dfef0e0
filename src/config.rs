//! Multi-threading configuration for frame-based analyses
//!
//! Every analysis that runs through [`SampledIntoSampled`](crate::SampledIntoSampled)
//! takes a [`ThreadingConfig`]. The defaults use all available processors with
//! chunks of 40 frames, which is a good compromise for LPC-type analyses.

use serde::{Deserialize, Serialize};

/// Default number of frames handed to one thread
pub const DEFAULT_FRAMES_PER_THREAD: usize = 40;

/// How the frames of an analysis are distributed over threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadingConfig {
    /// Run on more than one thread (false = everything on a single worker)
    pub use_multi_threading: bool,
    /// Maximum number of threads (0 = number of available processors)
    pub number_of_threads: usize,
    /// Target number of consecutive frames per thread
    pub frames_per_thread: usize,
    /// Record per-frame diagnostics in the status object
    ///
    /// Only consulted by [`crate::SampledIntoSampled`] used directly; the
    /// conversion entry points that hand back a status always record it.
    pub update_status: bool,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            use_multi_threading: true,
            number_of_threads: 0,
            frames_per_thread: DEFAULT_FRAMES_PER_THREAD,
            update_status: false,
        }
    }
}

impl ThreadingConfig {
    /// Configuration that runs all frames on one worker
    pub fn single_threaded() -> Self {
        Self {
            use_multi_threading: false,
            ..Self::default()
        }
    }

    /// Limit the number of threads (0 = all available processors)
    pub fn with_number_of_threads(mut self, number_of_threads: usize) -> Self {
        self.number_of_threads = number_of_threads;
        self
    }

    /// Set the target chunk size
    pub fn with_frames_per_thread(mut self, frames_per_thread: usize) -> Self {
        self.frames_per_thread = frames_per_thread;
        self
    }

    /// Enable or disable per-frame diagnostics
    pub fn with_status_updates(mut self, update_status: bool) -> Self {
        self.update_status = update_status;
        self
    }

    /// Number of threads that may be used for an analysis
    pub fn maximum_number_of_threads(&self) -> usize {
        if !self.use_multi_threading {
            return 1;
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if self.number_of_threads == 0 {
            available
        } else {
            self.number_of_threads.min(available.max(1)).max(1)
        }
    }

    /// Partition `number_of_frames` frames into contiguous chunks
    ///
    /// Returns `(number_of_threads, frames_per_chunk)`. Each thread gets
    /// exactly one chunk; only the last chunk may be shorter.
    pub fn partition(&self, number_of_frames: usize) -> (usize, usize) {
        if number_of_frames == 0 {
            return (0, 0);
        }
        let frames_per_thread = self.frames_per_thread.max(1);
        let wanted = number_of_frames.div_ceil(frames_per_thread);
        let number_of_threads = wanted.min(self.maximum_number_of_threads()).max(1);
        let chunk_size = number_of_frames.div_ceil(number_of_threads);
        // recompute so that no thread is left without frames
        (number_of_frames.div_ceil(chunk_size), chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ThreadingConfig::default();
        assert!(config.use_multi_threading);
        assert_eq!(config.frames_per_thread, 40);
        assert!(!config.update_status);
        assert!(config.maximum_number_of_threads() >= 1);
    }

    #[test]
    fn test_single_threaded_partition() {
        let config = ThreadingConfig::single_threaded();
        assert_eq!(config.partition(1000), (1, 1000));
        assert_eq!(config.partition(0), (0, 0));
    }

    #[test]
    fn test_partition_covers_all_frames() {
        let config = ThreadingConfig::default().with_frames_per_thread(7);
        for n in [1, 6, 7, 8, 50, 333] {
            let (threads, chunk) = config.partition(n);
            assert!(threads >= 1);
            assert!(threads * chunk >= n);
            assert!((threads - 1) * chunk < n);
        }
    }

    #[test]
    fn test_config_from_json() {
        let config: ThreadingConfig =
            serde_json::from_str(r#"{ "number_of_threads": 2, "update_status": true }"#).unwrap();
        assert_eq!(config.number_of_threads, 2);
        assert!(config.update_status);
        assert_eq!(config.frames_per_thread, DEFAULT_FRAMES_PER_THREAD);
        let json = serde_json::to_string(&config).unwrap();
        let back: ThreadingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
