use std::io::Read;

use crate::error::{Result, TtyrecError};
use crate::timeval::Timeval;

/// On-disk header size: seconds, microseconds and payload length, each an
/// unsigned 32-bit little-endian integer.
pub const HEADER_LEN: u64 = 12;

/// Maximum supported payload size in bytes. Real recorders emit payloads of
/// at most a few kilobytes per write; a larger declared length means the
/// stream is corrupt or not a ttyrec file at all.
pub const MAX_PAYLOAD: u32 = 8192;

/// A decoded record: capture timestamp plus the raw bytes that were written
/// to the recorded terminal. Payloads are opaque; only differences between
/// timestamps are meaningful.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: Timeval,
    pub payload: Vec<u8>,
}

impl Record {
    /// Total size of this record on disk (header plus payload).
    pub fn disk_len(&self) -> u64 {
        HEADER_LEN + self.payload.len() as u64
    }
}

/// Read the next record from the stream. Returns `Ok(None)` at end of
/// stream; a trailing header shorter than 12 bytes also counts as EOF.
///
/// The codec takes any `Read` so recordings can be consumed from stdin;
/// callers that need byte offsets track them from [`Record::disk_len`].
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<Record>> {
    let mut header = [0u8; HEADER_LEN as usize];
    if read_into(reader, &mut header)? < header.len() {
        return Ok(None);
    }

    let sec = u32::from_le_bytes(header[0..4].try_into().unwrap());
    let usec = u32::from_le_bytes(header[4..8].try_into().unwrap());
    let len = u32::from_le_bytes(header[8..12].try_into().unwrap());

    if len > MAX_PAYLOAD {
        return Err(TtyrecError::PayloadTooLarge {
            declared: len,
            max: MAX_PAYLOAD,
        });
    }

    let mut payload = vec![0u8; len as usize];
    let got = read_into(reader, &mut payload)?;
    if got < payload.len() {
        return Err(TtyrecError::ShortRead { declared: len, got });
    }

    Ok(Some(Record {
        timestamp: Timeval::from_header(sec, usec),
        payload,
    }))
}

/// Fill `buf` as far as the stream allows, returning the number of bytes
/// actually read. Unlike `read_exact` this reports how much arrived before
/// EOF, which the caller needs to tell a clean end of stream from a
/// truncated record.
fn read_into<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TtyrecError::Io(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Encode a single record the way ttyrec writes it.
    pub(crate) fn encode(sec: u32, usec: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN as usize + payload.len());
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&usec.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_read_single_record() {
        let data = encode(1683867154, 888000, b"hello");
        let mut cursor = Cursor::new(data);
        let rec = read_record(&mut cursor).unwrap().unwrap();
        assert_eq!(rec.timestamp, Timeval::new(1683867154, 888000));
        assert_eq!(rec.payload, b"hello");
        assert_eq!(rec.disk_len(), 17);
        assert!(read_record(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_empty_payload_is_legal() {
        let data = encode(10, 0, b"");
        let rec = read_record(&mut Cursor::new(data)).unwrap().unwrap();
        assert!(rec.payload.is_empty());
        assert_eq!(rec.disk_len(), HEADER_LEN);
    }

    #[test]
    fn test_empty_stream_is_eof() {
        assert!(read_record(&mut Cursor::new(vec![])).unwrap().is_none());
    }

    #[test]
    fn test_truncated_header_is_eof() {
        // Fewer than 12 bytes remaining counts as end of stream
        let data = vec![0x01, 0x00, 0x00, 0x00, 0x02];
        assert!(read_record(&mut Cursor::new(data)).unwrap().is_none());
    }

    #[test]
    fn test_short_payload_is_fatal() {
        let mut data = encode(0, 0, b"abcdef");
        data.truncate(data.len() - 3);
        let err = read_record(&mut Cursor::new(data)).unwrap_err();
        match err {
            TtyrecError::ShortRead { declared: 6, got: 3 } => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_payload_is_fatal() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(MAX_PAYLOAD + 1).to_le_bytes());
        let err = read_record(&mut Cursor::new(data)).unwrap_err();
        match err {
            TtyrecError::PayloadTooLarge { declared, max } => {
                assert_eq!(declared, MAX_PAYLOAD + 1);
                assert_eq!(max, MAX_PAYLOAD);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_max_payload_boundary_is_accepted() {
        let payload = vec![b'x'; MAX_PAYLOAD as usize];
        let data = encode(0, 0, &payload);
        let rec = read_record(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(rec.payload.len(), MAX_PAYLOAD as usize);
    }

    #[test]
    fn test_header_microseconds_normalised() {
        // A sloppy recorder can write usec >= 1_000_000; carry into seconds
        let data = encode(5, 1_500_000, b"a");
        let rec = read_record(&mut Cursor::new(data)).unwrap().unwrap();
        assert_eq!(rec.timestamp, Timeval::new(6, 500_000));
    }
}
