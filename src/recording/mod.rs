//! Audio recording feature for voxmemo.
//!
//! Provides microphone capture, the session lifecycle, live waveform
//! rendering and in-memory encoding of finished recordings.

pub mod analyser;
pub mod encoder;
pub mod microphone;
pub mod presenter;
pub mod schedule;
pub mod session;
pub mod timer;
pub mod waveform;

pub use microphone::{CaptureStream, CpalMicrophone, DeviceError, Microphone};
pub use presenter::Presenter;
pub use session::{SessionController, SessionEvent, SessionState};
pub use waveform::WaveformSurface;
