//! Channel Access wire header — standard and extended forms, big-endian.
//!
//! ```text
//! Standard header (16 bytes):
//! Offset  Size   Field
//! ──────  ─────  ──────────────
//!   0       2    command          u16
//!   2       2    payload_size     u16
//!   4       2    data_type        u16
//!   6       2    data_count       u16
//!   8       4    parameter1       u32
//!  12       4    parameter2       u32
//! ──────  ─────  ──────────────
//! Total:  16 bytes
//!
//! Extended header (24 bytes), selected when payload_size == 0xFFFF and
//! data_count == 0 in the leading 16 bytes:
//! Offset  Size   Field
//! ──────  ─────  ──────────────
//!   0       2    command          u16
//!   2       2    0xFFFF           sentinel
//!   4       2    data_type        u16
//!   6       2    0x0000           sentinel
//!   8       4    parameter1       u32
//!  12       4    parameter2       u32
//!  16       4    payload_size     u32
//!  20       4    data_count       u32
//! ──────  ─────  ──────────────
//! Total:  24 bytes
//! ```
//!
//! All multi-byte fields are big-endian. Payloads are padded to a
//! multiple of 8 bytes; the padding is not reflected in `payload_size`.

use crate::error::RemoteProtocolError;

/// Size of the standard 16-byte header.
pub const STANDARD_HEADER_SIZE: usize = 16;

/// Size of the extended 24-byte header.
pub const EXTENDED_HEADER_SIZE: usize = 24;

/// A decoded Channel Access header, independent of which wire form
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: u16,
    pub payload_size: u32,
    pub data_type: u16,
    pub data_count: u32,
    pub parameter1: u32,
    pub parameter2: u32,
}

impl Header {
    /// Number of bytes this header occupies on the wire, once encoded.
    pub fn wire_size(&self) -> usize {
        if self.needs_extended_form() {
            EXTENDED_HEADER_SIZE
        } else {
            STANDARD_HEADER_SIZE
        }
    }

    fn needs_extended_form(&self) -> bool {
        self.payload_size > 0xFFFF || self.data_count > 0xFFFF
    }

    /// Payload size rounded up to the next multiple of 8, as it appears
    /// on the wire following this header.
    pub fn padded_payload_size(&self) -> usize {
        let size = self.payload_size as usize;
        (size + 7) & !7
    }

    /// Encode this header to its wire form, choosing standard or
    /// extended framing automatically.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.needs_extended_form() {
            let mut buf = Vec::with_capacity(EXTENDED_HEADER_SIZE);
            buf.extend_from_slice(&self.command.to_be_bytes());
            buf.extend_from_slice(&0xFFFFu16.to_be_bytes());
            buf.extend_from_slice(&self.data_type.to_be_bytes());
            buf.extend_from_slice(&0x0000u16.to_be_bytes());
            buf.extend_from_slice(&self.parameter1.to_be_bytes());
            buf.extend_from_slice(&self.parameter2.to_be_bytes());
            buf.extend_from_slice(&self.payload_size.to_be_bytes());
            buf.extend_from_slice(&self.data_count.to_be_bytes());
            buf
        } else {
            let mut buf = Vec::with_capacity(STANDARD_HEADER_SIZE);
            buf.extend_from_slice(&self.command.to_be_bytes());
            buf.extend_from_slice(&(self.payload_size as u16).to_be_bytes());
            buf.extend_from_slice(&self.data_type.to_be_bytes());
            buf.extend_from_slice(&(self.data_count as u16).to_be_bytes());
            buf.extend_from_slice(&self.parameter1.to_be_bytes());
            buf.extend_from_slice(&self.parameter2.to_be_bytes());
            buf
        }
    }
}

/// Result of attempting to parse a header out of a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderParse {
    /// A full header was parsed. `consumed` is the number of header
    /// bytes taken from the front of the buffer (16 or 24).
    Complete { header: Header, consumed: usize },
    /// Not enough bytes are available yet; at least this many more
    /// bytes are needed before parsing can be retried.
    NeedMore(usize),
}

/// Parse a header from the front of `buf`, selecting standard or
/// extended framing per the sentinel rule in the leading 16 bytes.
pub fn parse_header(buf: &[u8]) -> Result<HeaderParse, RemoteProtocolError> {
    if buf.len() < STANDARD_HEADER_SIZE {
        return Ok(HeaderParse::NeedMore(STANDARD_HEADER_SIZE - buf.len()));
    }

    let command = u16::from_be_bytes([buf[0], buf[1]]);
    let leading_payload_size = u16::from_be_bytes([buf[2], buf[3]]);
    let data_type = u16::from_be_bytes([buf[4], buf[5]]);
    let leading_data_count = u16::from_be_bytes([buf[6], buf[7]]);
    let parameter1 = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let parameter2 = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);

    if leading_payload_size == 0xFFFF && leading_data_count == 0 {
        if buf.len() < EXTENDED_HEADER_SIZE {
            return Ok(HeaderParse::NeedMore(EXTENDED_HEADER_SIZE - buf.len()));
        }
        let payload_size = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);
        let data_count = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);
        Ok(HeaderParse::Complete {
            header: Header {
                command,
                payload_size,
                data_type,
                data_count,
                parameter1,
                parameter2,
            },
            consumed: EXTENDED_HEADER_SIZE,
        })
    } else {
        Ok(HeaderParse::Complete {
            header: Header {
                command,
                payload_size: leading_payload_size as u32,
                data_type,
                data_count: leading_data_count as u32,
                parameter1,
                parameter2,
            },
            consumed: STANDARD_HEADER_SIZE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            command: 1,
            payload_size: 8,
            data_type: 5,
            data_count: 1,
            parameter1: 100,
            parameter2: 200,
        }
    }

    #[test]
    fn standard_roundtrip() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), STANDARD_HEADER_SIZE);
        match parse_header(&bytes).unwrap() {
            HeaderParse::Complete { header: parsed, consumed } => {
                assert_eq!(consumed, STANDARD_HEADER_SIZE);
                assert_eq!(parsed, header);
            }
            HeaderParse::NeedMore(_) => panic!("expected complete parse"),
        }
    }

    #[test]
    fn extended_form_selected_for_large_payload() {
        let header = Header {
            payload_size: 0x1_0000,
            data_count: 1,
            ..sample_header()
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), EXTENDED_HEADER_SIZE);
        match parse_header(&bytes).unwrap() {
            HeaderParse::Complete { header: parsed, consumed } => {
                assert_eq!(consumed, EXTENDED_HEADER_SIZE);
                assert_eq!(parsed, header);
            }
            HeaderParse::NeedMore(_) => panic!("expected complete parse"),
        }
    }

    #[test]
    fn extended_form_selected_for_large_data_count() {
        let header = Header {
            data_count: 0x1_0000,
            ..sample_header()
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), EXTENDED_HEADER_SIZE);
        assert_eq!(header.wire_size(), EXTENDED_HEADER_SIZE);
    }

    #[test]
    fn need_more_on_short_buffer() {
        let bytes = [0u8; 10];
        match parse_header(&bytes).unwrap() {
            HeaderParse::NeedMore(n) => assert_eq!(n, STANDARD_HEADER_SIZE - 10),
            HeaderParse::Complete { .. } => panic!("expected NeedMore"),
        }
    }

    #[test]
    fn need_more_for_extended_tail() {
        let header = Header {
            payload_size: 0x1_0000,
            ..sample_header()
        };
        let bytes = header.to_bytes();
        match parse_header(&bytes[..STANDARD_HEADER_SIZE]).unwrap() {
            HeaderParse::NeedMore(n) => assert_eq!(n, EXTENDED_HEADER_SIZE - STANDARD_HEADER_SIZE),
            HeaderParse::Complete { .. } => panic!("expected NeedMore"),
        }
    }

    #[test]
    fn padded_payload_size_rounds_to_8() {
        let header = Header {
            payload_size: 5,
            ..sample_header()
        };
        assert_eq!(header.padded_payload_size(), 8);
        let header = Header {
            payload_size: 16,
            ..sample_header()
        };
        assert_eq!(header.padded_payload_size(), 16);
    }
}
