//! Newline-delimited JSON framing shared by the simulator client, the
//! inference service and the load driver.
//!
//! A frame is every byte up to (not including) the next `\n`. Bytes are
//! buffered undecoded until a newline arrives, so a read boundary that falls
//! inside a multi-byte character never corrupts a frame.

use log::trace;
use serde::Serialize;
use std::io::{self, ErrorKind, Read, Write};
use thiserror::Error;

/// Upper bound on a single frame. Longer frames are dropped up to their
/// newline and reported as [`FrameError::FrameTooLarge`].
pub const MAX_FRAME_LEN: usize = 1 << 20;

const READ_CHUNK_LEN: usize = 4096;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("connection lost")]
    ConnectionLost,
    #[error("frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("frame exceeds the maximum frame length")]
    FrameTooLarge,
    #[error("could not encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FrameError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        )
    }
}

#[derive(Default, Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    // dropping the tail of an oversized frame until its newline
    discarding: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, bytes: &[u8]) {
        let bytes = if self.discarding {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    self.discarding = false;
                    &bytes[newline + 1..]
                }
                None => return,
            }
        } else {
            bytes
        };
        self.buffer.extend_from_slice(bytes);
    }
    /// Splits off the first complete frame, keeping the remainder buffered.
    pub fn next_frame(&mut self) -> Option<Result<String, FrameError>> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let rest = self.buffer.split_off(newline + 1);
        let mut frame = std::mem::replace(&mut self.buffer, rest);
        frame.pop();
        Some(String::from_utf8(frame).map_err(FrameError::from))
    }
    pub fn has_partial_frame(&self) -> bool {
        !self.buffer.is_empty()
    }
    /// Drops the frame at the front of the buffer, including bytes of it that
    /// have not arrived yet.
    pub fn skip_frame(&mut self) {
        match self.buffer.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                self.buffer.drain(..=newline);
            }
            None => {
                self.buffer.clear();
                self.discarding = true;
            }
        }
    }
    fn check_len(&self) -> Result<(), FrameError> {
        if self.buffer.len() > MAX_FRAME_LEN {
            Err(FrameError::FrameTooLarge)
        } else {
            Ok(())
        }
    }
}

pub struct FrameReader<R> {
    reader: R,
    decoder: FrameDecoder,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::new(),
        }
    }
    /// Blocks until one full frame is available.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly between
    /// frames and `Err(FrameError::ConnectionLost)` when it closed mid-frame.
    /// After `Err(FrameError::FrameTooLarge)` the oversized frame is skipped
    /// and the next call resumes at the frame after it.
    pub fn read_frame(&mut self) -> Result<Option<String>, FrameError> {
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return frame.map(Some);
            }
            if let Err(e) = self.decoder.check_len() {
                self.decoder.skip_frame();
                return Err(e);
            }
            let n = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                return if self.decoder.has_partial_frame() {
                    Err(FrameError::ConnectionLost)
                } else {
                    Ok(None)
                };
            }
            trace!("read {n} bytes");
            self.decoder.push(&chunk[..n]);
        }
    }
}

/// Writes `value` as one JSON line.
pub fn write_frame<W, T>(mut writer: W, value: &T) -> Result<(), FrameError>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    const STREAM: &str = "{\"a\":\"héllo\"}\n{\"b\":[1,2]}\n\n{\"c\":\"日本\"}\n";

    fn decode_in_chunks(bytes: &[u8], chunk_len: usize) -> Vec<String> {
        let mut decoder = FrameDecoder::new();
        let mut frames = vec![];
        for chunk in bytes.chunks(chunk_len) {
            decoder.push(chunk);
            while let Some(frame) = decoder.next_frame() {
                frames.push(frame.unwrap());
            }
        }
        assert!(!decoder.has_partial_frame());
        frames
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(5)]
    #[case(7)]
    #[case(64)]
    fn any_split_yields_the_same_frames(#[case] chunk_len: usize) {
        let whole = decode_in_chunks(STREAM.as_bytes(), STREAM.len());
        assert_eq!(whole.len(), 4);
        assert_eq!(whole[2], "");
        assert_eq!(decode_in_chunks(STREAM.as_bytes(), chunk_len), whole);
    }

    #[test]
    fn split_inside_multibyte_character_is_buffered() {
        let bytes = "{\"c\":\"日\"}\n".as_bytes();
        // byte 7 is inside the three-byte encoding of 日
        let mut decoder = FrameDecoder::new();
        decoder.push(&bytes[..7]);
        assert!(decoder.next_frame().is_none());
        decoder.push(&bytes[7..]);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), "{\"c\":\"日\"}");
    }

    #[test]
    fn remainder_is_kept_for_the_next_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"first\nsec");
        assert_eq!(decoder.next_frame().unwrap().unwrap(), "first");
        assert!(decoder.next_frame().is_none());
        assert!(decoder.has_partial_frame());
        decoder.push(b"ond\n");
        assert_eq!(decoder.next_frame().unwrap().unwrap(), "second");
    }

    #[test]
    fn reader_reports_clean_eof_and_mid_frame_eof_differently() {
        let mut reader = FrameReader::new(Cursor::new(b"one\ntwo\n".to_vec()));
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("one"));
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("two"));
        assert!(reader.read_frame().unwrap().is_none());

        let mut reader = FrameReader::new(Cursor::new(b"one\ntw".to_vec()));
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("one"));
        assert!(matches!(reader.read_frame(), Err(FrameError::ConnectionLost)));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let bytes = vec![b'x'; MAX_FRAME_LEN + READ_CHUNK_LEN + 1];
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert!(matches!(reader.read_frame(), Err(FrameError::FrameTooLarge)));
    }

    #[test]
    fn reader_resumes_after_an_oversized_frame() {
        let mut bytes = b"before\n".to_vec();
        bytes.extend(vec![b' '; 2 * MAX_FRAME_LEN]);
        bytes.extend_from_slice(b"tail\nafter\n");
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("before"));
        assert!(matches!(reader.read_frame(), Err(FrameError::FrameTooLarge)));
        assert_eq!(reader.read_frame().unwrap().as_deref(), Some("after"));
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn skipped_frame_is_dropped_across_pushes() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"partial");
        decoder.skip_frame();
        assert!(!decoder.has_partial_frame());
        decoder.push(b"more of it");
        assert!(!decoder.has_partial_frame());
        decoder.push(b" end\nnext\n");
        assert_eq!(decoder.next_frame().unwrap().unwrap(), "next");
    }

    #[test]
    fn written_frames_end_with_a_single_newline() {
        let mut out = vec![];
        write_frame(&mut out, &serde_json::json!({"pong": true})).unwrap();
        assert_eq!(out, b"{\"pong\":true}\n");
    }
}
