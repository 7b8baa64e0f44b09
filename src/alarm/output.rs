//! Playing a decoded clip on the default output device

use std::time::Duration;

use super::{pcm::PcmReader, AlarmClip, AlarmError};

/// How often playback completion is checked
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fully silent device callbacks required before the stream is closed, so the
/// last buffered samples reach the speaker
pub const DRAIN_CALLBACKS: u8 = 2;

/// Whether this build can open an audio device at all
pub const PLAYBACK_SUPPORTED: bool = cfg!(feature = "playback");

/// Feeds device buffers from a clip and reports when the tail has drained
#[derive(Debug)]
pub struct ClipFeed {
    samples: PcmReader,
    silent_callbacks: u8,
}

impl ClipFeed {
    pub fn new(clip: &AlarmClip) -> Self {
        Self {
            samples: PcmReader::new(clip.pcm.clone()),
            silent_callbacks: 0,
        }
    }

    /// Fill one device buffer, padding with silence past the end of the clip.
    ///
    /// Returns true once `DRAIN_CALLBACKS` buffers in a row were all silence.
    pub fn fill(&mut self, data: &mut [f32]) -> bool {
        let mut played = false;
        for slot in data.iter_mut() {
            *slot = match self.samples.next() {
                Some(sample) => {
                    played = true;
                    sample
                }
                None => 0.0,
            };
        }
        if !played {
            self.silent_callbacks = self.silent_callbacks.saturating_add(1);
        }
        self.silent_callbacks >= DRAIN_CALLBACKS
    }
}

/// Play the clip to completion, blocking the calling thread, then release the device.
#[cfg(feature = "playback")]
pub fn play_clip(clip: &AlarmClip) -> Result<(), AlarmError> {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    };

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::debug;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AlarmError::Output("no default audio output device".to_string()))?;

    let config = cpal::StreamConfig {
        channels: clip.channels,
        sample_rate: cpal::SampleRate(clip.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let finished = Arc::new(AtomicBool::new(false));
    let failure: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    let mut feed = ClipFeed::new(clip);
    let done = Arc::clone(&finished);
    let stream_failure = Arc::clone(&failure);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if feed.fill(data) {
                    done.store(true, Ordering::Release);
                }
            },
            move |err| {
                let mut slot = stream_failure.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.is_none() {
                    *slot = Some(format!("audio stream error: {}", err));
                }
            },
            None,
        )
        .map_err(|e| AlarmError::Output(format!("unable to open the audio output: {}", e)))?;

    stream
        .play()
        .map_err(|e| AlarmError::Output(format!("unable to start playback: {}", e)))?;
    debug!("Alarm playback started");

    while !finished.load(Ordering::Acquire) {
        if let Some(err) = failure.lock().unwrap_or_else(PoisonError::into_inner).take() {
            return Err(AlarmError::Output(err));
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    stream
        .pause()
        .map_err(|e| AlarmError::Output(format!("unable to close the audio output: {}", e)))?;
    drop(stream);
    debug!("Alarm playback finished");
    Ok(())
}

/// Without the `playback` feature there is no device to open.
#[cfg(not(feature = "playback"))]
pub fn play_clip(clip: &AlarmClip) -> Result<(), AlarmError> {
    Err(AlarmError::Output(format!(
        "built without audio playback support, {} samples not played",
        clip.sample_count()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::pcm::encode_f32_le;

    fn clip(samples: &[f32]) -> AlarmClip {
        AlarmClip {
            sample_rate: 22_050,
            channels: 1,
            pcm: encode_f32_le(samples),
        }
    }

    #[test]
    fn feed_keeps_playing_until_tail_has_drained() {
        let mut feed = ClipFeed::new(&clip(&[0.5, 0.25, -0.5]));
        let mut buffer = [1.0f32; 2];

        assert!(!feed.fill(&mut buffer));
        assert_eq!(buffer, [0.5, 0.25]);

        // Last samples are still in this buffer, so it is not yet drained.
        assert!(!feed.fill(&mut buffer));
        assert_eq!(buffer, [-0.5, 0.0]);

        assert!(!feed.fill(&mut buffer));
        assert_eq!(buffer, [0.0, 0.0]);
        assert!(feed.fill(&mut buffer));
    }

    #[test]
    fn empty_clip_drains_after_silent_buffers() {
        let mut feed = ClipFeed::new(&clip(&[]));
        let mut buffer = [0.0f32; 4];
        for _ in 1..DRAIN_CALLBACKS {
            assert!(!feed.fill(&mut buffer));
        }
        assert!(feed.fill(&mut buffer));
    }
}
