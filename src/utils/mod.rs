//! Low-level signal processing used by the frame analyses

pub mod fft;
pub mod lpc;

pub use fft::FrameFft;
pub use lpc::BurgWorkspace;
