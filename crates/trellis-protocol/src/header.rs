//! Fixed frame header and field codecs.
//!
//! The header is six bytes: command (1), slot (1), timestamp (4). All
//! multi-byte integers on the wire are big-endian. Reads go through a
//! `Cursor` and fail with `MalformedFrame` when fewer bytes remain than the
//! field width; writes append to a `Vec` and cannot fail.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use trellis_core::{ErrorKind, Result};

/// Frame commands carried by every reliable channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Data-carrying frame requiring acknowledgment.
    Push = 1,
    /// Acknowledgment correlated to a push by slot and sequence/timestamp.
    Ack = 2,
}

impl Command {
    fn from_byte(byte: u8) -> Option<Command> {
        match byte {
            1 => Some(Command::Push),
            2 => Some(Command::Ack),
            _ => None,
        }
    }
}

/// The fixed-width header shared by every reliable frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Push or Ack.
    pub command: Command,
    /// Slot id within the sending module's window.
    pub slot: u8,
    /// Sender's local millisecond clock at send time.
    pub time: u32,
}

/// Appends the fixed header to `buffer`.
pub fn write_header(buffer: &mut Vec<u8>, command: Command, slot: u8, time: u32) {
    buffer.push(command as u8);
    buffer.push(slot);
    buffer.extend_from_slice(&time.to_be_bytes());
}

/// Reads the fixed header; the exact inverse of [`write_header`].
pub fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<Header> {
    let command = cursor.read_u8().map_err(|_| ErrorKind::MalformedFrame)?;
    let command = Command::from_byte(command).ok_or(ErrorKind::MalformedFrame)?;
    let slot = cursor.read_u8().map_err(|_| ErrorKind::MalformedFrame)?;
    let time = cursor.read_u32::<BigEndian>().map_err(|_| ErrorKind::MalformedFrame)?;
    Ok(Header { command, slot, time })
}

/// Appends a 16-bit sequence field.
pub fn write_seq16(buffer: &mut Vec<u8>, seq: u16) {
    buffer.extend_from_slice(&seq.to_be_bytes());
}

/// Reads a 16-bit sequence field.
pub fn read_seq16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    cursor.read_u16::<BigEndian>().map_err(|_| ErrorKind::MalformedFrame)
}

/// Appends a 64-bit sequence field.
pub fn write_seq64(buffer: &mut Vec<u8>, seq: u64) {
    buffer.extend_from_slice(&seq.to_be_bytes());
}

/// Reads a 64-bit sequence field.
pub fn read_seq64(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    cursor.read_u64::<BigEndian>().map_err(|_| ErrorKind::MalformedFrame)
}

/// Returns the unread remainder of the cursor as the frame payload.
pub fn payload<'a>(cursor: &Cursor<&'a [u8]>) -> &'a [u8] {
    let buf = *cursor.get_ref();
    let pos = (cursor.position() as usize).min(buf.len());
    &buf[pos..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let mut buffer = Vec::new();
        write_header(&mut buffer, Command::Push, 7, 123_456);
        assert_eq!(buffer.len(), trellis_core::constants::HEADER_SIZE);

        let mut cursor = Cursor::new(buffer.as_slice());
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.command, Command::Push);
        assert_eq!(header.slot, 7);
        assert_eq!(header.time, 123_456);
    }

    #[test]
    fn test_short_header_is_malformed() {
        let bytes = [1u8, 3, 0, 0]; // two timestamp bytes missing
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(read_header(&mut cursor), Err(ErrorKind::MalformedFrame)));
    }

    #[test]
    fn test_unknown_command_is_malformed() {
        let bytes = [9u8, 0, 0, 0, 0, 0];
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(read_header(&mut cursor), Err(ErrorKind::MalformedFrame)));
    }

    #[test]
    fn test_sequence_fields_big_endian() {
        let mut buffer = Vec::new();
        write_seq16(&mut buffer, 0x0102);
        write_seq64(&mut buffer, 0x0A0B0C0D_0E0F_1011);
        assert_eq!(&buffer[..2], &[0x01, 0x02]);

        let mut cursor = Cursor::new(buffer.as_slice());
        assert_eq!(read_seq16(&mut cursor).unwrap(), 0x0102);
        assert_eq!(read_seq64(&mut cursor).unwrap(), 0x0A0B0C0D_0E0F_1011);
        assert!(payload(&cursor).is_empty());
    }

    #[test]
    fn test_payload_is_unread_remainder() {
        let mut buffer = Vec::new();
        write_header(&mut buffer, Command::Ack, 0, 1);
        buffer.extend_from_slice(b"tail");

        let mut cursor = Cursor::new(buffer.as_slice());
        read_header(&mut cursor).unwrap();
        assert_eq!(payload(&cursor), b"tail");
    }
}
