//! Binary weight blobs shared by the parametric agents.
//!
//! Layout (little-endian):
//! `magic[4] | version u32 | sections u32 | crc32(payload) u32 | reserved u32 | payload`

use std::fs;
use std::path::Path;

use crate::error::WeightsError;

pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 20;

/// Frames `payload` with the header for `magic`.
pub fn encode(magic: &[u8; 4], sections: u32, payload: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(payload);
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(magic);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&sections.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Checks the header and returns `(sections, payload)`.
pub fn decode<'a>(magic: &[u8; 4], data: &'a [u8]) -> Result<(u32, &'a [u8]), WeightsError> {
    if data.len() < HEADER_SIZE {
        return Err(WeightsError::Truncated(format!(
            "header: expected at least {HEADER_SIZE} bytes, got {}",
            data.len()
        )));
    }

    if &data[0..4] != magic {
        return Err(WeightsError::Magic {
            expected: String::from_utf8_lossy(magic).into_owned(),
        });
    }

    let mut header = Reader::new(&data[4..HEADER_SIZE]);
    let version = header.u32("version")?;
    if version != VERSION {
        return Err(WeightsError::Version {
            expected: VERSION,
            actual: version,
        });
    }

    let sections = header.u32("section count")?;
    let expected = header.u32("checksum")?;
    let payload = &data[HEADER_SIZE..];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(WeightsError::Crc { expected, actual });
    }

    Ok((sections, payload))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WeightsError> {
    fs::write(path, bytes).map_err(|source| WeightsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved weights");
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, WeightsError> {
    let bytes = fs::read(path).map_err(|source| WeightsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loaded weights");
    Ok(bytes)
}

pub fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Cursor over a payload.
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], WeightsError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| WeightsError::Truncated(what.to_string()))?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8, WeightsError> {
        Ok(self.take(1, what)?[0])
    }

    pub fn bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], WeightsError> {
        self.take(len, what)
    }

    pub fn u32(&mut self, what: &str) -> Result<u32, WeightsError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn f32s(&mut self, count: usize, what: &str) -> Result<Vec<f32>, WeightsError> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| WeightsError::Shape(format!("{what}: byte length overflow")))?;
        Ok(self
            .take(len, what)?
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    /// Fails unless the whole payload was consumed.
    pub fn finish(self) -> Result<(), WeightsError> {
        if self.offset == self.data.len() {
            Ok(())
        } else {
            Err(WeightsError::TrailingBytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &[u8; 4] = b"TEST";

    fn sample() -> Vec<u8> {
        let mut payload = Vec::new();
        push_f32s(&mut payload, &[1.0, -2.5]);
        encode(MAGIC, 1, &payload)
    }

    #[test]
    fn decode_returns_sections_and_payload() {
        let bytes = sample();

        let (sections, payload) = decode(MAGIC, &bytes).unwrap();
        let mut reader = Reader::new(payload);

        assert_eq!(sections, 1);
        assert_eq!(reader.f32s(2, "values").unwrap(), vec![1.0, -2.5]);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn decode_rejects_invalid_magic() {
        let bytes = sample();

        let err = decode(b"NOPE", &bytes).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn decode_rejects_unsupported_version() {
        let mut bytes = sample();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());

        let err = decode(MAGIC, &bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn decode_rejects_crc_mismatch() {
        let mut bytes = sample();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let err = decode(MAGIC, &bytes).unwrap_err();
        assert!(err.to_string().contains("CRC32"));
    }

    #[test]
    fn decode_rejects_short_header() {
        let err = decode(MAGIC, b"TES").unwrap_err();
        assert!(matches!(err, WeightsError::Truncated(_)));
    }

    #[test]
    fn reader_reports_truncation_and_trailing_bytes() {
        let mut payload = Vec::new();
        push_f32s(&mut payload, &[0.5]);

        let mut reader = Reader::new(&payload);
        assert!(matches!(reader.f32s(2, "values"), Err(WeightsError::Truncated(_))));

        let reader = Reader::new(&payload);
        assert!(matches!(reader.finish(), Err(WeightsError::TrailingBytes)));
    }
}
