//! Text decoding of byte streams.

use crate::{Result, TableError};
use encoding_rs::{
    DecoderResult, EncoderResult, Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252,
};
use std::io::{self, Read};

const CHUNK_SIZE: usize = 8192;

/// Codec names used by data descriptors that are not WHATWG labels.
/// ISO-8859-1 decodes as windows-1252, its superset.
fn alias(label: &str) -> Option<&'static Encoding> {
    match label {
        "utf-8-sig" | "utf8" | "u8" => Some(UTF_8),
        "latin-1" | "latin1" | "l1" | "iso8859-1" | "iso-8859-1" | "8859" | "cp819"
        | "cp1252" => Some(WINDOWS_1252),
        "utf-16-le" | "utf-16le" => Some(UTF_16LE),
        "utf-16-be" | "utf-16be" => Some(UTF_16BE),
        _ => None,
    }
}

/// Resolves an encoding label (`utf-8`, `utf-8-sig`, `latin-1`, ...).
///
/// Labels are matched case-insensitively with `_` read as `-`; `cpNNNN`
/// falls back to `windows-NNNN`.
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_lowercase().replace('_', "-");
    if let Some(encoding) = alias(&normalized) {
        return Ok(encoding);
    }
    let windows = normalized
        .strip_prefix("cp")
        .map(|page| format!("windows-{page}"));
    Encoding::for_label(normalized.as_bytes())
        .or_else(|| windows.and_then(|label| Encoding::for_label(label.as_bytes())))
        .ok_or_else(|| TableError::encoding(format!("encoding \"{label}\" is not supported")))
}

/// Decodes a byte stream into UTF-8, failing on malformed input instead of
/// replacing it. A byte order mark is removed.
pub struct DecodingReader<R> {
    inner: R,
    encoding: &'static Encoding,
    decoder: encoding_rs::Decoder,
    input: Vec<u8>,
    input_start: usize,
    input_end: usize,
    output: Vec<u8>,
    output_start: usize,
    eof: bool,
    finished: bool,
    malformed: bool,
    decoded: u64,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            decoder: encoding.new_decoder(),
            input: vec![0; CHUNK_SIZE],
            input_start: 0,
            input_end: 0,
            output: Vec::with_capacity(CHUNK_SIZE * 3),
            output_start: 0,
            eof: false,
            finished: false,
            malformed: false,
            decoded: 0,
        }
    }

    fn malformed(&self) -> io::Error {
        TableError::encoding(format!(
            "'{}' codec can't decode byte at position {}",
            self.encoding.name().to_lowercase(),
            self.decoded
        ))
        .into_io()
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.output_start < self.output.len() {
                let available = &self.output[self.output_start..];
                let count = available.len().min(buf.len());
                buf[..count].copy_from_slice(&available[..count]);
                self.output_start += count;
                return Ok(count);
            }
            if self.malformed {
                return Err(self.malformed());
            }
            if self.finished {
                return Ok(0);
            }

            if self.input_start == self.input_end && !self.eof {
                self.input_start = 0;
                self.input_end = self.inner.read(&mut self.input)?;
                self.eof = self.input_end == 0;
            }

            self.output.clear();
            self.output.resize(CHUNK_SIZE * 3, 0);
            self.output_start = 0;
            let (result, read, written) = self.decoder.decode_to_utf8_without_replacement(
                &self.input[self.input_start..self.input_end],
                &mut self.output,
                self.eof,
            );
            self.input_start += read;
            self.decoded += read as u64;
            self.output.truncate(written);

            match result {
                // text decoded before the malformed bytes is served first
                DecoderResult::Malformed(_, _) => self.malformed = true,
                DecoderResult::InputEmpty if self.eof => self.finished = true,
                DecoderResult::InputEmpty | DecoderResult::OutputFull => {}
            }
        }
    }
}

/// Encodes text, failing on unmappable characters.
pub fn encode(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    let mut encoder = encoding.new_encoder();
    let mut output = vec![0; text.len() * 4 + 16];
    let (result, _, written) = encoder.encode_from_utf8_without_replacement(text, &mut output, true);
    match result {
        EncoderResult::InputEmpty => {
            output.truncate(written);
            Ok(output)
        }
        _ => Err(TableError::encoding(format!(
            "text cannot be encoded as {}",
            encoding.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn decode(bytes: &[u8], label: &str) -> std::result::Result<String, TableError> {
        let mut reader = DecodingReader::new(Cursor::new(bytes.to_vec()), lookup_encoding(label)?);
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|error| TableError::from_io(error, ErrorCode::SchemeError))?;
        Ok(text)
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        assert_eq!(decode(b"\xEF\xBB\xBFid\n1\n", "utf-8-sig").unwrap(), "id\n1\n");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode(b"caf\xE9", "latin-1").unwrap(), "café");
    }

    #[test]
    fn test_codec_aliases() {
        for label in ["latin_1", "ISO8859-1", "cp1252", "L1"] {
            assert_eq!(lookup_encoding(label).unwrap(), WINDOWS_1252, "{label}");
        }
        assert_eq!(lookup_encoding("utf_16_le").unwrap(), UTF_16LE);
        assert_eq!(lookup_encoding("utf-16-be").unwrap(), UTF_16BE);
        assert_eq!(lookup_encoding("UTF8").unwrap(), UTF_8);
        assert_eq!(lookup_encoding("cp1251").unwrap(), encoding_rs::WINDOWS_1251);
    }

    #[test]
    fn test_decode_large_input() {
        let text = "ä".repeat(CHUNK_SIZE * 2 + 1);
        assert_eq!(decode(text.as_bytes(), "utf-8").unwrap(), text);
    }

    #[test]
    fn test_malformed_input_is_encoding_error() {
        let error = decode(b"id\n\xFF\xFE\xFD\n", "utf-8").unwrap_err();
        assert_eq!(error.code(), ErrorCode::EncodingError);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(
            lookup_encoding("klingon").unwrap_err().code(),
            ErrorCode::EncodingError
        );
    }

    #[test]
    fn test_encode() {
        let bytes = encode("café", encoding_rs::WINDOWS_1252).unwrap();
        assert_eq!(bytes, b"caf\xE9");
    }
}
