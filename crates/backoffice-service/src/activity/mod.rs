//! Login/logout activity recording.

pub mod recorder;

pub use recorder::ActivityRecorder;
