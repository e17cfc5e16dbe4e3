pub mod devices;
pub mod new_protocol;
pub mod request;
pub mod response;

use thiserror::Error;

pub const FRAME_FLAG: u8 = 0xaa;
/// Length of the fixed header shared by every frame.
pub const HEADER_LENGTH: usize = 10;
/// Header plus the trailing checksum byte.
pub const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + 1;

/// Two's complement of the byte sum, truncated to a byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChecksumError {
    #[error("Not enough bytes given. A frame has at least {min} bytes, got {len}.", min = MIN_FRAME_LENGTH)]
    FrameTooShort { len: usize },
    #[error("checksum failed, got: 0x{got:02x}, expected: 0x{expected:02x}")]
    Mismatch { got: u8, expected: u8 },
}

/// Check the trailing checksum byte of a received frame.
///
/// Parsing never does this on its own, since devices in the field are not
/// always consistent about it. Call it when stricter handling is wanted.
pub fn verify_checksum(frame: &[u8]) -> std::result::Result<(), ChecksumError> {
    if frame.len() < MIN_FRAME_LENGTH {
        return Err(ChecksumError::FrameTooShort { len: frame.len() });
    }
    let got = frame[frame.len() - 1];
    let expected = checksum(&frame[1..frame.len() - 1]);
    if got != expected {
        return Err(ChecksumError::Mismatch { got, expected });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Set,
    Query,
    Notify1,
    Notify2,
    Exception,
    QuerySn,
    Exception2,
    QuerySubtype,
    /// Opcode we have no name for. Devices do send these.
    Unknown(u8),
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x02 => Self::Set,
            0x03 => Self::Query,
            0x04 => Self::Notify1,
            0x05 => Self::Notify2,
            0x06 => Self::Exception,
            0x07 => Self::QuerySn,
            0x0a => Self::Exception2,
            0xa0 => Self::QuerySubtype,
            other => Self::Unknown(other),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Set => 0x02,
            Self::Query => 0x03,
            Self::Notify1 => 0x04,
            Self::Notify2 => 0x05,
            Self::Exception => 0x06,
            Self::QuerySn => 0x07,
            Self::Exception2 => 0x0a,
            Self::QuerySubtype => 0xa0,
            Self::Unknown(byte) => *byte,
        }
    }
}

impl From<u8> for MessageType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        message_type.as_byte()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Unknown(byte) => write!(f, "unknown(0x{byte:02x})"),
            known => write!(f, "{:?}(0x{:02x})", known, known.as_byte()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn checksum_is_negated_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x01]), 0xff);
        assert_eq!(checksum(&[0x80, 0x80]), 0);
        assert_eq!(checksum(&[0x0b, 0xea, 0x00]), 0x0b);
    }

    #[test]
    fn checksum_makes_frame_sum_to_zero() {
        let body = [0x0b, 0xea, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x12];
        let sum = body
            .iter()
            .fold(checksum(&body), |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn message_type_keeps_unknown_opcodes() {
        for byte in 0..=u8::MAX {
            assert_eq!(MessageType::from_byte(byte).as_byte(), byte);
        }
        assert_eq!(MessageType::from_byte(0xa0), MessageType::QuerySubtype);
        assert_eq!(MessageType::from_byte(0x0a), MessageType::Exception2);
        assert_eq!(MessageType::from_byte(0x42), MessageType::Unknown(0x42));
    }

    #[test]
    fn verify_checksum_detects_corruption() {
        let mut frame = vec![0xaa, 0x0b, 0xea, 0, 0, 0, 0, 0, 0, 0x03, 0x00];
        let sum = checksum(&frame[1..]);
        frame.push(sum);
        assert_eq!(verify_checksum(&frame), Ok(()));

        frame[10] = 0x01;
        assert!(matches!(
            verify_checksum(&frame),
            Err(ChecksumError::Mismatch { .. })
        ));
        assert_eq!(
            verify_checksum(&frame[..5]),
            Err(ChecksumError::FrameTooShort { len: 5 })
        );
    }
}
