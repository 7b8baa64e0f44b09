//! Alarm sound collaborator
//!
//! Phase ends ring an [`Alarm`]. The real implementation decodes the
//! embedded sound and plays it on a blocking thread, fully detached from
//! the timer; failures are logged and otherwise ignored.

pub mod decode;
pub mod error;
pub mod output;
pub mod pcm;

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

pub use decode::{decode_clip, AlarmClip, MAX_DECODED_SAMPLES};
pub use error::AlarmError;
pub use output::{play_clip, PLAYBACK_SUPPORTED};

/// The alarm sound shipped with the binary
pub static ALARM_SOUND: &[u8] = include_bytes!("../../assets/alarm.wav");

/// Something that can be rung when a phase ends.
///
/// `ring` must return promptly; any slow work belongs on another task.
pub trait Alarm: Send + Sync + std::fmt::Debug {
    fn ring(&self);
}

/// Alarm configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmConfig {
    /// When false, phase ends never attempt playback
    pub enabled: bool,
}

/// Plays the embedded sound on the default output device
#[derive(Debug)]
pub struct AudioAlarm {
    config: AlarmConfig,
    sound: &'static [u8],
    playbacks: AtomicUsize,
}

impl AudioAlarm {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            sound: ALARM_SOUND,
            playbacks: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Number of playbacks handed to a blocking thread so far
    pub fn playbacks(&self) -> usize {
        self.playbacks.load(Ordering::SeqCst)
    }
}

impl Alarm for AudioAlarm {
    fn ring(&self) {
        if !self.config.enabled {
            debug!("Alarm disabled, skipping playback");
            return;
        }

        let sound = self.sound;
        info!("Ringing alarm");
        self.playbacks.fetch_add(1, Ordering::SeqCst);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = play_alarm(sound) {
                warn!("Unable to play the alarm sound: {}", e);
            }
        });
    }
}

/// Decode `sound` fully and play it, returning once playback has finished
pub fn play_alarm(sound: &'static [u8]) -> Result<(), AlarmError> {
    let clip = decode_clip(sound)?;
    play_clip(&clip)
}
