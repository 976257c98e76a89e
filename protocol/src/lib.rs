//! Recording format for simulator runs.
//!
//! A recording is a stream of length-prefixed records: one `Header`, then a
//! `Frame` per sampled tick. Each record is a little-endian `u32` byte length
//! followed by the bincode payload.

use std::io::{self, Read, Write};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single record; anything larger is treated as corruption.
pub const MAX_RECORD_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("record of {0} bytes exceeds limit")]
    RecordTooLarge(u32),
    #[error("unsupported protocol version {found} (expected {})", PROTOCOL_VERSION)]
    Version { found: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    pub protocol: u32,
    pub run_id: Uuid,
    pub tick_hz: u32,
    pub seed: u64,
    /// Species names; `AgentSnapshot::species` indexes into this list.
    pub species: Vec<String>,
}

impl RecordingHeader {
    pub fn new(tick_hz: u32, seed: u64, species: Vec<String>) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            run_id: Uuid::new_v4(),
            tick_hz,
            seed,
            species,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u64,
    pub species: u16,
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub orientation: [f32; 4],
    pub velocity: [f32; 3],
    pub surfaced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub time: f32,
    pub agents: Vec<AgentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Header(RecordingHeader),
    Frame(Frame),
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(bincode::serialize(msg)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn write_record<W: Write>(w: &mut W, record: &Record) -> Result<(), ProtocolError> {
    let bytes = encode(record)?;
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    if len > MAX_RECORD_BYTES {
        return Err(ProtocolError::RecordTooLarge(len));
    }
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&bytes)?;
    Ok(())
}

/// Read the next record, or `None` at a clean end of stream.
pub fn read_record<R: Read>(r: &mut R) -> Result<Option<Record>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        match r.read(&mut len_buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("record length cut after {filled} of 4 bytes"),
                )
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let len = u32::from_le_bytes(len_buf);
    if len > MAX_RECORD_BYTES {
        return Err(ProtocolError::RecordTooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)?;
    let record: Record = decode(&payload)?;
    if let Record::Header(h) = &record {
        if h.protocol != PROTOCOL_VERSION {
            return Err(ProtocolError::Version { found: h.protocol });
        }
    }
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(tick: u64) -> Frame {
        Frame {
            tick,
            time: tick as f32 / 50.0,
            agents: vec![AgentSnapshot {
                id: 3,
                species: 1,
                position: [1.0, -2.0, 3.0],
                orientation: [0.0, 0.0, 0.0, 1.0],
                velocity: [0.0, 0.0, 5.0],
                surfaced: false,
            }],
        }
    }

    #[test]
    fn stream_reads_back_in_order_then_ends() {
        let header = RecordingHeader::new(50, 7, vec!["sardine".into(), "shark".into()]);
        let mut buf = Vec::new();
        write_record(&mut buf, &Record::Header(header.clone())).unwrap();
        write_record(&mut buf, &Record::Frame(frame(0))).unwrap();
        write_record(&mut buf, &Record::Frame(frame(10))).unwrap();

        let mut r = Cursor::new(buf);
        assert_eq!(read_record(&mut r).unwrap(), Some(Record::Header(header)));
        assert_eq!(read_record(&mut r).unwrap(), Some(Record::Frame(frame(0))));
        assert_eq!(read_record(&mut r).unwrap(), Some(Record::Frame(frame(10))));
        assert_eq!(read_record(&mut r).unwrap(), None);
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut buf = Vec::new();
        write_record(&mut buf, &Record::Frame(frame(1))).unwrap();
        buf.truncate(buf.len() - 3);
        let err = read_record(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)), "{err}");
    }

    #[test]
    fn cut_length_prefix_is_an_error() {
        let mut buf = Vec::new();
        write_record(&mut buf, &Record::Frame(frame(1))).unwrap();
        let whole = buf.len();
        write_record(&mut buf, &Record::Frame(frame(2))).unwrap();
        buf.truncate(whole + 2);

        let mut r = Cursor::new(buf);
        assert_eq!(read_record(&mut r).unwrap(), Some(Record::Frame(frame(1))));
        let err = read_record(&mut r).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)), "{err}");
    }

    #[test]
    fn foreign_version_is_rejected() {
        let mut header = RecordingHeader::new(30, 0, vec![]);
        header.protocol = PROTOCOL_VERSION + 1;
        let mut buf = Vec::new();
        write_record(&mut buf, &Record::Header(header)).unwrap();
        let err = read_record(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ProtocolError::Version { .. }));
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_allocating() {
        let mut buf = (MAX_RECORD_BYTES + 1).to_le_bytes().to_vec();
        buf.extend_from_slice(&[0; 8]);
        let err = read_record(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, ProtocolError::RecordTooLarge(_)));
    }
}
