//! Microphone acquisition.
//!
//! [`Microphone`] is the seam between the session controller and the audio
//! backend. [`CpalMicrophone`] opens a cpal input stream on a configured or
//! default device, mixes it down to mono and buffers the samples until the
//! controller drains them.

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Reasons a microphone stream could not be acquired.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The platform refused access to the input device.
    #[error("Microphone access denied: {0}")]
    NotAllowed(String),
    /// No matching input device exists.
    #[error("No audio input device found: {0}")]
    NotFound(String),
    /// The device exists but could not be opened or started.
    #[error("Audio input device could not be opened: {0}")]
    NotReadable(String),
    /// The device cannot deliver a usable stream format.
    #[error("Audio input format not supported: {0}")]
    Overconstrained(String),
}

impl DeviceError {
    /// Short kind name shown to the user.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotAllowed(_) => "NotAllowedError",
            Self::NotFound(_) => "NotFoundError",
            Self::NotReadable(_) => "NotReadableError",
            Self::Overconstrained(_) => "OverconstrainedError",
        }
    }

    /// Classifies a backend-specific failure message.
    fn from_backend(message: String) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("not permitted")
        {
            Self::NotAllowed(message)
        } else if lower.contains("no such") || lower.contains("not found") {
            Self::NotFound(message)
        } else {
            Self::NotReadable(message)
        }
    }
}

/// A live capture that buffers mono samples until drained.
///
/// Dropping the stream releases the underlying device.
pub trait CaptureStream {
    /// Sample rate of the delivered samples in Hz.
    fn sample_rate(&self) -> u32;

    /// Removes and returns every sample captured since the last call.
    fn take_samples(&mut self) -> Vec<i16>;
}

/// Source of capture streams.
#[async_trait(?Send)]
pub trait Microphone {
    /// Stream type handed out on success.
    type Stream: CaptureStream;

    /// Acquires the input device and starts capturing.
    async fn acquire(&mut self) -> Result<Self::Stream, DeviceError>;
}

/// Microphone backed by the system's cpal host.
pub struct CpalMicrophone {
    /// Device name, numeric index, or "default"
    device_name: String,
    /// Requested rate; the device's native rate wins when they differ
    requested_sample_rate: u32,
}

impl CpalMicrophone {
    /// Creates a microphone for `device_name` ("default", an index, or a name).
    pub fn new(device_name: String, requested_sample_rate: u32) -> Self {
        Self {
            device_name,
            requested_sample_rate,
        }
    }

    fn open(&self) -> Result<CpalCapture, DeviceError> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if self.device_name == "default" {
                host.default_input_device().ok_or_else(|| {
                    DeviceError::NotFound("no default input device available".to_string())
                })
            } else {
                find_device(&host, &self.device_name)
            }
        })?;

        let device_label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_label);

        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                DeviceError::NotFound(format!("device '{device_label}' disappeared"))
            }
            cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
                DeviceError::Overconstrained(format!("device '{device_label}' has no input stream"))
            }
            cpal::DefaultStreamConfigError::BackendSpecific { err } => {
                DeviceError::from_backend(err.description)
            }
            #[allow(unreachable_patterns)]
            other => DeviceError::NotReadable(other.to_string()),
        })?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();

        if sample_rate != self.requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.requested_sample_rate,
                sample_rate
            );
        }
        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            channels,
            format
        );

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let config: cpal::StreamConfig = supported.into();

        let stream = match format {
            SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, &buffer, |s| s),
            SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, &buffer, |s| {
                (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
            }),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, &buffer, |s| {
                (s as i32 - 32768) as i16
            }),
            other => Err(DeviceError::Overconstrained(format!(
                "unsupported sample format {other:?}"
            ))),
        }?;

        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => {
                DeviceError::NotFound(format!("device '{device_label}' disappeared"))
            }
            cpal::PlayStreamError::BackendSpecific { err } => {
                DeviceError::from_backend(err.description)
            }
            #[allow(unreachable_patterns)]
            other => DeviceError::NotReadable(other.to_string()),
        })?;
        tracing::debug!("Audio stream started");

        Ok(CpalCapture {
            _stream: stream,
            buffer,
            sample_rate,
        })
    }
}

#[async_trait(?Send)]
impl Microphone for CpalMicrophone {
    type Stream = CpalCapture;

    async fn acquire(&mut self) -> Result<CpalCapture, DeviceError> {
        self.open()
    }
}

/// Running cpal input stream and its sample buffer.
pub struct CpalCapture {
    _stream: cpal::Stream,
    buffer: Arc<Mutex<Vec<i16>>>,
    sample_rate: u32,
}

impl CaptureStream for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn take_samples(&mut self) -> Vec<i16> {
        let mut guard = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    buffer: &Arc<Mutex<Vec<i16>>>,
    to_i16: fn(T) -> i16,
) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample + 'static,
{
    let buffer = Arc::clone(buffer);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut samples = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                downmix(data, channels, to_i16, &mut samples);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                DeviceError::NotFound("device is no longer available".to_string())
            }
            cpal::BuildStreamError::StreamConfigNotSupported
            | cpal::BuildStreamError::InvalidArgument => {
                DeviceError::Overconstrained(e.to_string())
            }
            cpal::BuildStreamError::BackendSpecific { err } => {
                DeviceError::from_backend(err.description)
            }
            #[allow(unreachable_patterns)]
            other => DeviceError::NotReadable(other.to_string()),
        })
}

/// Averages interleaved frames into mono samples appended to `out`.
fn downmix<T: Copy>(data: &[T], channels: usize, to_i16: fn(T) -> i16, out: &mut Vec<i16>) {
    if channels <= 1 {
        out.extend(data.iter().map(|&s| to_i16(s)));
        return;
    }

    for frame in data.chunks_exact(channels) {
        let sum: i32 = frame.iter().map(|&s| to_i16(s) as i32).sum();
        out.push((sum / channels as i32) as i16);
    }
}

/// Finds an input device by numeric index or exact name.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, DeviceError> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| DeviceError::from_backend(format!("failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            DeviceError::NotFound(format!(
                "device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            ))
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().map(|n| n == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            DeviceError::NotFound(format!(
                "'{device_spec}' not found. Use 'voxmemo list-devices' to see available devices."
            ))
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let Ok(dev_null) = OpenOptions::new().write(true).open("/dev/null") else {
        return f();
    };

    // SAFETY: dup/dup2/close only operate on file descriptors owned by this process.
    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }
    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    f()
}
