//! Device specific body decoding.
//!
//! None of the device bodies carry a tag saying which layout they use. Each
//! family instead keeps an ordered table of [`VariantRule`]s keyed on the
//! device protocol version, the message type and a few probe bytes at fixed
//! offsets. The first matching rule picks the layout. Adding a layout means
//! adding a row.

pub mod dc;
pub mod e1;
pub mod ea;

use log::debug;

use crate::{
    MessageType,
    response::{FieldValue, Response},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolGeneration {
    Any,
    /// Device protocol version 0.
    Legacy,
    /// Any non-zero device protocol version.
    Current,
}

impl ProtocolGeneration {
    pub fn matches(&self, device_protocol_version: u8) -> bool {
        match self {
            Self::Any => true,
            Self::Legacy => device_protocol_version == 0,
            Self::Current => device_protocol_version != 0,
        }
    }
}

/// A byte test at a fixed body offset. Offsets past the end never match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Byte { offset: usize, value: u8 },
    /// Inclusive range.
    Range { offset: usize, min: u8, max: u8 },
}

impl Probe {
    pub fn matches(&self, body: &[u8]) -> bool {
        match *self {
            Self::Byte { offset, value } => body.get(offset) == Some(&value),
            Self::Range { offset, min, max } => body
                .get(offset)
                .is_some_and(|byte| (min..=max).contains(byte)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VariantRule<S> {
    pub generation: ProtocolGeneration,
    pub message_types: &'static [MessageType],
    /// All of them have to match.
    pub probes: &'static [Probe],
    pub shape: S,
}

impl<S: Copy> VariantRule<S> {
    pub fn matches(&self, device_protocol_version: u8, message_type: MessageType, body: &[u8]) -> bool {
        self.generation.matches(device_protocol_version)
            && self.message_types.contains(&message_type)
            && self.probes.iter().all(|probe| probe.matches(body))
    }
}

/// Walk `rules` in order and return the shape of the first one that matches.
pub fn select_shape<S: Copy>(
    rules: &[VariantRule<S>],
    device_protocol_version: u8,
    message_type: MessageType,
    body: &[u8],
) -> Option<S> {
    rules
        .iter()
        .find(|rule| rule.matches(device_protocol_version, message_type, body))
        .map(|rule| rule.shape)
}

/// Decoded body of one of the supported device families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceBody {
    Ea(ea::EaBody),
    E1(e1::E1Body),
    Dc(dc::DcBody),
}

impl DeviceBody {
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            Self::Ea(body) => body.fields(),
            Self::E1(body) => body.fields(),
            Self::Dc(body) => body.fields(),
        }
    }
}

/// Turns the raw body of a parsed response into a [`DeviceBody`].
pub trait DeviceDecoder {
    const DEVICE_TYPE: u8;

    /// `None` when the message is not one this family knows how to read.
    fn decode_body(response: &Response) -> Option<DeviceBody>;

    /// Decode and attach the result to the response. Returns whether anything
    /// was attached.
    fn decode(response: &mut Response) -> bool {
        match Self::decode_body(response) {
            Some(body) => {
                response.set_decoded(body);
                true
            }
            None => {
                debug!(
                    "device 0x{:02x}: no layout for protocol {} / {}",
                    Self::DEVICE_TYPE,
                    response.device_protocol_version(),
                    response.message_type()
                );
                false
            }
        }
    }
}

/// Decode with the family matching the response's own device type.
pub fn decode(response: &mut Response) -> bool {
    decode_as(response.device_type(), response)
}

/// Decode with the family registered for `device_type`, whatever the header says.
pub fn decode_as(device_type: u8, response: &mut Response) -> bool {
    match device_type {
        ea::DEVICE_TYPE => ea::Ea::decode(response),
        e1::DEVICE_TYPE => e1::E1::decode(response),
        dc::DEVICE_TYPE => dc::Dc::decode(response),
        other => {
            debug!("no decoder for device type 0x{other:02x}");
            false
        }
    }
}

/// Little endian u16 at `offset`, missing bytes read as 0.
pub(crate) fn read_u16(body: &[u8], offset: usize) -> u16 {
    use crate::response::read_byte;
    u16::from_le_bytes([read_byte(body, offset), read_byte(body, offset + 1)])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::request::Request;

    const RULES: &[VariantRule<u8>] = &[
        VariantRule {
            generation: ProtocolGeneration::Legacy,
            message_types: &[MessageType::Query],
            probes: &[Probe::Byte { offset: 1, value: 0x10 }],
            shape: 1,
        },
        VariantRule {
            generation: ProtocolGeneration::Any,
            message_types: &[MessageType::Query, MessageType::Set],
            probes: &[Probe::Range {
                offset: 0,
                min: 0x02,
                max: 0x04,
            }],
            shape: 2,
        },
    ];

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(select_shape(RULES, 0, MessageType::Query, &[0x03, 0x10]), Some(1));
        assert_eq!(select_shape(RULES, 1, MessageType::Query, &[0x03, 0x10]), Some(2));
        assert_eq!(select_shape(RULES, 0, MessageType::Set, &[0x04]), Some(2));
        assert_eq!(select_shape(RULES, 0, MessageType::Set, &[0x05]), None);
        assert_eq!(select_shape(RULES, 0, MessageType::Notify1, &[0x03, 0x10]), None);
    }

    #[test]
    fn probes_past_the_end_do_not_match() {
        assert!(!Probe::Byte { offset: 3, value: 0 }.matches(&[0, 0, 0]));
        assert!(!Probe::Range { offset: 0, min: 0, max: 255 }.matches(&[]));
        assert_eq!(select_shape(RULES, 0, MessageType::Query, &[]), None);
    }

    #[test]
    fn unknown_device_type_is_left_alone() {
        let frame = Request::new(0xac, 0, MessageType::Query, Some(0x00), vec![0; 30]).serialize();
        let mut response = Response::parse(&frame).unwrap();
        assert!(!decode(&mut response));
        assert!(response.decoded().is_none());
    }

    #[test]
    fn decode_as_overrides_the_header() {
        let frame = Request::new(0xac, 0, MessageType::Query, Some(0x03), vec![0x01]).serialize();
        let mut response = Response::parse(&frame).unwrap();
        assert!(decode_as(dc::DEVICE_TYPE, &mut response));
        assert!(matches!(response.decoded(), Some(DeviceBody::Dc(_))));
    }

    #[test]
    fn read_u16_is_little_endian() {
        assert_eq!(read_u16(&[0x00, 0x34, 0x12], 1), 0x1234);
        assert_eq!(read_u16(&[0x00, 0x34], 1), 0x0034);
        assert_eq!(read_u16(&[], 5), 0);
    }
}
