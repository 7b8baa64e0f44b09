//! Little-endian `f32` PCM byte streams
//!
//! Decoded samples are serialized to a plain byte stream before they reach
//! the output side, which reads them back one sample at a time.

const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Serialize interleaved samples as little-endian `f32`
pub fn encode_f32_le(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_BYTES);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Reads samples back out of a little-endian `f32` byte stream.
///
/// A trailing partial sample is ignored.
#[derive(Debug, Clone)]
pub struct PcmReader {
    bytes: Vec<u8>,
    position: usize,
}

impl PcmReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }

    /// Samples not yet read
    pub fn remaining(&self) -> usize {
        (self.bytes.len() - self.position) / SAMPLE_BYTES
    }
}

impl Iterator for PcmReader {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let end = self.position + SAMPLE_BYTES;
        let chunk: [u8; SAMPLE_BYTES] = self.bytes.get(self.position..end)?.try_into().ok()?;
        self.position = end;
        Some(f32::from_le_bytes(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_little_endian() {
        let bytes = encode_f32_le(&[1.0, -0.5]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3f, 0x00, 0x00, 0x00, 0xbf]);
    }

    #[test]
    fn reader_yields_samples_in_order() {
        let reader = PcmReader::new(encode_f32_le(&[0.25, 0.5, -1.0]));
        assert_eq!(reader.remaining(), 3);
        assert_eq!(reader.collect::<Vec<_>>(), vec![0.25, 0.5, -1.0]);
    }

    #[test]
    fn reader_drops_trailing_partial_sample() {
        let mut bytes = encode_f32_le(&[0.75]);
        bytes.extend_from_slice(&[0x01, 0x02]);
        let mut reader = PcmReader::new(bytes);
        assert_eq!(reader.remaining(), 1);
        assert_eq!(reader.next(), Some(0.75));
        assert_eq!(reader.next(), None);
    }
}
