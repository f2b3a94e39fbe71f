//! Pure byte-buffer-to-command parsing.
//!
//! `parse_stream` is the TCP-oriented entry point: given an append-only
//! receive buffer, it returns either the next fully parsed command (and
//! how many bytes it consumed) or a `NeedData` signal carrying the
//! minimum number of additional bytes required before parsing can be
//! retried. `parse_datagram` is the UDP variant: a single datagram is
//! atomic, so it parses every command the datagram holds and errors if
//! a trailing partial command remains.

use crate::command::Command;
use crate::error::RemoteProtocolError;
use crate::header::{self, HeaderParse};

/// Outcome of attempting to parse one command from the front of a
/// stream buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameResult {
    /// A full command was parsed, consuming `consumed` bytes from the
    /// front of the buffer.
    Command { command: Command, consumed: usize },
    /// Not enough bytes are buffered yet; at least this many more are
    /// needed before parsing can succeed.
    NeedData(usize),
}

/// Parse at most one command from the front of `buf`.
///
/// `from_server` says whether the peer that produced these bytes is
/// acting as the server (used to disambiguate request/response shapes
/// that share a wire command code).
pub fn parse_stream(buf: &[u8], from_server: bool) -> Result<FrameResult, RemoteProtocolError> {
    let (parsed_header, header_size) = match header::parse_header(buf)? {
        HeaderParse::Complete { header, consumed } => (header, consumed),
        HeaderParse::NeedMore(n) => return Ok(FrameResult::NeedData(n)),
    };

    let padded = parsed_header.padded_payload_size();
    let total = header_size + padded;
    if buf.len() < total {
        return Ok(FrameResult::NeedData(total - buf.len()));
    }

    let payload = &buf[header_size..header_size + parsed_header.payload_size as usize];
    let command = Command::from_header_and_payload(&parsed_header, payload, from_server)?;
    Ok(FrameResult::Command { command, consumed: total })
}

/// Parse every command contained in one UDP datagram.
///
/// A datagram is atomic: a trailing partial command (one that would
/// return `NeedData` under `parse_stream`) is a protocol error, since
/// there is no "next read" that could ever complete it.
pub fn parse_datagram(buf: &[u8], from_server: bool) -> Result<Vec<Command>, RemoteProtocolError> {
    let mut commands = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        match parse_stream(&buf[offset..], from_server)? {
            FrameResult::Command { command, consumed } => {
                commands.push(command);
                offset += consumed;
            }
            FrameResult::NeedData(_) => {
                return Err(RemoteProtocolError::new(
                    "datagram ended with a partial command".to_string(),
                ));
            }
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SearchReplyPolicy;

    fn version_request() -> Command {
        Command::VersionRequest { priority: 0, version: 13 }
    }

    #[test]
    fn exact_header_only_command_parses() {
        let bytes = version_request().to_bytes();
        assert_eq!(bytes.len(), 16);
        match parse_stream(&bytes, false).unwrap() {
            FrameResult::Command { command, consumed } => {
                assert_eq!(command, version_request());
                assert_eq!(consumed, 16);
            }
            FrameResult::NeedData(_) => panic!("expected a command"),
        }
    }

    #[test]
    fn one_byte_short_needs_one_more() {
        let bytes = version_request().to_bytes();
        match parse_stream(&bytes[..bytes.len() - 1], false).unwrap() {
            FrameResult::NeedData(n) => assert_eq!(n, 1),
            FrameResult::Command { .. } => panic!("expected NeedData"),
        }
    }

    #[test]
    fn one_byte_past_leaves_remainder() {
        let mut bytes = version_request().to_bytes();
        bytes.push(0xAB);
        match parse_stream(&bytes, false).unwrap() {
            FrameResult::Command { consumed, .. } => {
                assert_eq!(consumed, bytes.len() - 1);
            }
            FrameResult::NeedData(_) => panic!("expected a command"),
        }
    }

    #[test]
    fn two_commands_in_one_feed() {
        let mut buf = Command::VersionResponse { version: 13 }.to_bytes();
        buf.extend(Command::AccessRightsResponse { cid: 0, access_rights: 1 }.to_bytes());

        let FrameResult::Command { command, consumed } = parse_stream(&buf, true).unwrap() else {
            panic!("expected first command");
        };
        assert_eq!(command, Command::VersionResponse { version: 13 });

        let FrameResult::Command { command, .. } = parse_stream(&buf[consumed..], true).unwrap()
        else {
            panic!("expected second command");
        };
        assert_eq!(
            command,
            Command::AccessRightsResponse { cid: 0, access_rights: 1 }
        );

        match parse_stream(&buf[buf.len()..], true).unwrap() {
            FrameResult::NeedData(n) => assert_eq!(n, 16),
            FrameResult::Command { .. } => panic!("expected NeedData on empty buffer"),
        }
    }

    #[test]
    fn unknown_command_code_is_remote_error() {
        let mut bytes = vec![0u8; 16];
        bytes[0..2].copy_from_slice(&0xBEEFu16.to_be_bytes());
        assert!(parse_stream(&bytes, true).is_err());
    }

    #[test]
    fn datagram_with_two_commands() {
        let search = Command::SearchRequest {
            name: "simple:A".into(),
            cid: 0,
            version: 13,
            reply: SearchReplyPolicy::ReplyRequired,
        };
        let mut buf = search.to_bytes();
        buf.extend(search.to_bytes());
        let commands = parse_datagram(&buf, false).unwrap();
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn datagram_with_trailing_partial_is_an_error() {
        let mut buf = version_request().to_bytes();
        buf.extend_from_slice(&[0u8; 5]);
        assert!(parse_datagram(&buf, false).is_err());
    }
}
