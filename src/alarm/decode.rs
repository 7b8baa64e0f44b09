//! Decoding the embedded alarm sound

use std::io::{Cursor, ErrorKind};

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};
use tracing::debug;

use super::{pcm::encode_f32_le, AlarmError};

/// Upper bound on decoded interleaved samples kept from the asset
pub const MAX_DECODED_SAMPLES: usize = 671_558;

/// A fully decoded sound, ready for the output side
#[derive(Debug, Clone)]
pub struct AlarmClip {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved little-endian `f32` samples
    pub pcm: Vec<u8>,
}

impl AlarmClip {
    pub fn sample_count(&self) -> usize {
        self.pcm.len() / std::mem::size_of::<f32>()
    }
}

/// Decode an encoded sound held in memory.
///
/// Any container/codec symphonia was built with is accepted; decoding stops
/// at end of stream or after `MAX_DECODED_SAMPLES` samples.
pub fn decode_clip(encoded: &'static [u8]) -> Result<AlarmClip, AlarmError> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(encoded)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(AlarmError::DecoderInit)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AlarmError::DecoderInit(SymphoniaError::Unsupported(
            "no audio track in the alarm sound",
        )))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(AlarmError::DecoderInit)?;

    let mut sample_rate = params.sample_rate;
    let mut channels = params.channels.map(|channels| channels.count() as u16);
    let mut samples: Vec<f32> = Vec::new();

    while samples.len() < MAX_DECODED_SAMPLES {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AlarmError::Decode(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(AlarmError::Decode)?;
        let spec = *decoded.spec();
        sample_rate = sample_rate.or(Some(spec.rate));
        channels = channels.or(Some(spec.channels.count() as u16));

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.len() > MAX_DECODED_SAMPLES {
        debug!(
            "Alarm sound truncated from {} to {} samples",
            samples.len(),
            MAX_DECODED_SAMPLES
        );
        samples.truncate(MAX_DECODED_SAMPLES);
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(AlarmError::DecoderInit(SymphoniaError::Unsupported(
            "alarm sound has no sample rate or channel layout",
        )));
    };

    debug!(
        "Decoded alarm sound: {} samples, {} Hz, {} channel(s)",
        samples.len(),
        sample_rate,
        channels
    );

    Ok(AlarmClip {
        sample_rate,
        channels,
        pcm: encode_f32_le(&samples),
    })
}
