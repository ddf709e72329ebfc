//! Wire Text Encoding for Captured Frames

use can_bus::CanFrame;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Default floor of the diagnostic reply identifier band.
pub const DEFAULT_REPLY_FLOOR: u16 = 0x7E8;

/// Wire text format for encoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordFormat {
    /// `<seconds>:<hex-pairs>,` — the compact form the batching threshold
    /// is tuned for.
    HexCompact,
    /// One JSON object per line (earlier design, kept for consumers that
    /// still expect it).
    Json,
}

impl Default for RecordFormat {
    fn default() -> Self {
        RecordFormat::HexCompact
    }
}

/// A record parsed back out of the hex-compact wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// Monotonic seconds since capture start.
    pub timestamp: f64,
    /// Payload bytes spanned by the record.
    pub payload: Vec<u8>,
}

#[derive(Serialize)]
struct JsonRecord {
    timestamp: f64,
    id: String,
    data: String,
}

/// Encodes one captured frame per record.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    format: RecordFormat,
    reply_floor: u16,
}

impl FrameCodec {
    pub fn new(format: RecordFormat, reply_floor: u16) -> Self {
        Self {
            format,
            reply_floor,
        }
    }

    /// Encode one frame. `timestamp` is monotonic seconds since capture
    /// start.
    pub fn encode(&self, timestamp: f64, frame: &CanFrame) -> Result<String, CodecError> {
        match self.format {
            RecordFormat::HexCompact => {
                let hex = to_hex(self.record_span(frame));
                // millisecond precision matches the capture clock
                Ok(format!("{timestamp:.3}:{hex},"))
            }
            RecordFormat::Json => {
                let payload = frame.payload();
                let data = if payload.is_empty() {
                    String::new()
                } else {
                    format!("0x{}", to_hex(payload))
                };
                let record = JsonRecord {
                    timestamp,
                    id: format!("0x{:03x}", frame.id()),
                    data,
                };
                let mut line = serde_json::to_string(&record)?;
                line.push('\n');
                Ok(line)
            }
        }
    }

    /// Parse a single hex-compact record back into timestamp and payload.
    pub fn parse(record: &str) -> Result<ParsedRecord, CodecError> {
        let body = record
            .strip_suffix(',')
            .ok_or(CodecError::MissingTerminator)?;
        let (ts, hex) = body.split_once(':').ok_or(CodecError::MissingSeparator)?;
        let timestamp: f64 = ts
            .parse()
            .map_err(|_| CodecError::BadTimestamp(ts.to_string()))?;
        // reject non-ASCII up front so the byte-pair slicing below can
        // never split a multi-byte character
        if !hex.is_ascii() || hex.len() % 2 != 0 {
            return Err(CodecError::BadHex(hex.to_string()));
        }
        let payload = (0..hex.len())
            .step_by(2)
            .map(|i| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| CodecError::BadHex(hex.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParsedRecord { timestamp, payload })
    }

    /// Payload span that goes on the wire.
    ///
    /// Diagnostic replies carry a length byte and a service echo ahead of
    /// the data. Those are skipped and the span is clamped to the length
    /// the frame itself declares, so a lying length byte can never read
    /// past the physical payload.
    fn record_span<'a>(&self, frame: &'a CanFrame) -> &'a [u8] {
        let payload = frame.payload();
        if frame.id() < self.reply_floor || payload.is_empty() {
            return payload;
        }
        let declared = payload[0] as usize;
        let end = declared.min(payload.len() - 1);
        if end < 2 {
            &[]
        } else {
            &payload[2..=end]
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
