//! Hardware audio input via CPAL
//!
//! [`FrameSource`] abstracts a microphone-like input that pushes fixed-size
//! PCM frames to an installed handler. [`MicSource`] is the production
//! implementation over the default CPAL input device; tests substitute a
//! scripted source.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};

use super::CaptureError;

/// Samples per delivered frame
pub const FRAME_SIZE: u32 = 2048;

/// Handler invoked on the capture thread with each frame, converted to f32.
/// The slice is only valid for the duration of the call.
pub type FrameHandler = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// A source of raw PCM frames
pub trait FrameSource {
    /// Number of input channels currently available (0 means no usable
    /// device)
    fn channels(&self) -> u16;

    /// Effective sample rate of the source
    fn sample_rate(&self) -> u32;

    /// Install the frame handler and begin producing frames
    fn start(&mut self, handler: FrameHandler) -> Result<(), CaptureError>;

    /// Stop producing frames and remove the handler
    fn stop(&mut self);
}

/// Microphone input from the default CPAL device at its native format
pub struct MicSource {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    channels: u16,
    stream: Option<Stream>,
}

impl MicSource {
    /// Open the default input device.
    pub fn new() -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        log::info!("Using audio input device: {:?}", device.name());

        let supported_config = device
            .default_input_config()
            .map_err(|_| CaptureError::NoSupportedConfig)?;

        log::info!(
            "Audio config: {} Hz, {} channels, {:?}",
            supported_config.sample_rate().0,
            supported_config.channels(),
            supported_config.sample_format()
        );

        let sample_format = supported_config.sample_format();
        let channels = supported_config.channels();
        let mut config: StreamConfig = supported_config.into();
        config.buffer_size = BufferSize::Fixed(FRAME_SIZE);

        Ok(Self {
            device,
            config,
            sample_format,
            channels,
            stream: None,
        })
    }

    fn build_stream(&self, handler: FrameHandler) -> Result<Stream, CaptureError> {
        let err_fn = |err| log::error!("Audio stream error: {}", err);

        match self.sample_format {
            SampleFormat::I16 => self.build_stream_typed::<i16>(handler, err_fn),
            SampleFormat::U16 => self.build_stream_typed::<u16>(handler, err_fn),
            SampleFormat::F32 => self.build_stream_typed::<f32>(handler, err_fn),
            _ => Err(CaptureError::NoSupportedConfig),
        }
    }

    fn build_stream_typed<T>(
        &self,
        mut handler: FrameHandler,
        err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
    ) -> Result<Stream, CaptureError>
    where
        T: cpal::SizedSample + cpal::Sample<Float = f32> + Send + 'static,
    {
        let config = self.config.clone();

        // Scratch buffer reused across callbacks; handlers must not retain
        // the slice.
        let mut scratch: Vec<f32> = Vec::with_capacity(FRAME_SIZE as usize);

        let stream = self
            .device
            .build_input_stream(
                &config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.extend(data.iter().map(|s| s.to_float_sample()));
                    handler(&scratch);
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamCreationFailed(e.to_string()))?;

        Ok(stream)
    }
}

impl FrameSource for MicSource {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self, handler: FrameHandler) -> Result<(), CaptureError> {
        let stream = self.build_stream(handler)?;

        stream.play().map_err(|e| {
            CaptureError::StreamCreationFailed(format!("Failed to start stream: {}", e))
        })?;

        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the stream removes the callback and stops capture.
        self.stream = None;
    }
}
