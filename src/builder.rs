//! Builder for constructing an [`AudioDriver`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::LowLatencyBackend;
use crate::driver::AudioDriver;
use crate::sink::{CpalDevice, OutputDevice};
use crate::source::SampleSource;
use crate::{EventCallback, PlaybackConfig, PlaybackError, PlaybackEvent};

/// Entry point for the crate.
///
/// # Example
///
/// ```no_run
/// use playback_audio::{MockSource, PlaybackAudio};
///
/// let mut source = MockSource::new(32_768);
/// source.generate_sine(440.0, 1000);
///
/// let mut driver = PlaybackAudio::builder()
///     .source(source)
///     .build()
///     .expect("source was configured");
///
/// driver.start_if_needed();
/// // ... emulation runs, the source produces samples ...
/// driver.stop();
/// ```
pub struct PlaybackAudio;

impl PlaybackAudio {
    /// Creates a builder for an [`AudioDriver`].
    pub fn builder() -> PlaybackAudioBuilder {
        PlaybackAudioBuilder::new()
    }
}

/// Builder for [`AudioDriver`].
///
/// A sample source is required; everything else has defaults. The
/// default output device is the system default via cpal, and no
/// low-latency backend is configured unless one is injected.
pub struct PlaybackAudioBuilder {
    source: Option<Box<dyn SampleSource>>,
    device: Option<Box<dyn OutputDevice>>,
    native: Option<Box<dyn LowLatencyBackend>>,
    config: PlaybackConfig,
    on_event: Option<EventCallback>,
}

impl PlaybackAudioBuilder {
    fn new() -> Self {
        Self {
            source: None,
            device: None,
            native: None,
            config: PlaybackConfig::default(),
            on_event: None,
        }
    }

    /// Sets the sample source. Required.
    pub fn source(mut self, source: impl SampleSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sets a boxed sample source. Required (alternative form).
    pub fn source_boxed(mut self, source: Box<dyn SampleSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the output device. Defaults to the system default
    /// output via cpal.
    pub fn device(mut self, device: impl OutputDevice + 'static) -> Self {
        self.device = Some(Box::new(device));
        self
    }

    /// Injects a platform low-latency backend to try before the
    /// generic stream path.
    pub fn low_latency_backend(mut self, backend: impl LowLatencyBackend + 'static) -> Self {
        self.native = Some(Box::new(backend));
        self
    }

    /// Overrides the playback configuration.
    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a callback for runtime events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(PlaybackEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(callback));
        self
    }

    /// Builds the driver.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoSourceConfigured`] if no source was
    /// set. This is the only fallible step in the crate's lifecycle;
    /// once built, starting and stopping never error.
    pub fn build(self) -> Result<AudioDriver, PlaybackError> {
        let source = self.source.ok_or(PlaybackError::NoSourceConfigured)?;
        let device = self.device.unwrap_or_else(|| Box::new(CpalDevice::new()));

        Ok(AudioDriver::new(
            Arc::new(Mutex::new(source)),
            device,
            self.native,
            self.config,
            self.on_event,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MockDevice;
    use crate::MockSource;

    #[test]
    fn test_build_requires_source() {
        let result = PlaybackAudio::builder().build();
        assert!(matches!(result, Err(PlaybackError::NoSourceConfigured)));
    }

    #[test]
    fn test_build_with_source_and_mock_device() {
        let driver = PlaybackAudio::builder()
            .source(MockSource::new(32_768))
            .device(MockDevice::new())
            .build()
            .unwrap();
        assert_eq!(driver.state(), crate::PlaybackState::Stopped);
        assert_eq!(driver.backend_kind(), crate::BackendKind::Disabled);
    }

    #[test]
    fn test_build_with_custom_config() {
        let config = PlaybackConfig {
            frames_per_write: 512,
            ..Default::default()
        };
        let driver = PlaybackAudio::builder()
            .source(MockSource::new(48_000))
            .device(MockDevice::new())
            .config(config)
            .build()
            .unwrap();
        drop(driver);
    }
}
