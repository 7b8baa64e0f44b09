//! Alarm playback errors

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Everything that can go wrong between the embedded asset and the speaker
#[derive(Error, Debug)]
pub enum AlarmError {
    /// The asset could not be probed or has no playable track
    #[error("unable to initialize a decoder for the alarm sound: {0}")]
    DecoderInit(#[source] SymphoniaError),

    /// A packet failed to decode (end of stream is not an error)
    #[error("unable to decode the alarm sound: {0}")]
    Decode(#[source] SymphoniaError),

    /// Opening, driving, or closing the audio output failed
    #[error("audio output failed: {0}")]
    Output(String),
}
