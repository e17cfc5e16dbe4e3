use thiserror::Error;

use crate::{HEADER_LENGTH, MIN_FRAME_LENGTH, MessageType, devices::DeviceBody};

/// A decoded field value, as exposed by [`Response::fields`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    Bytes(Vec<u8>),
    /// The field exists for this shape but the body was too short to carry it.
    Missing,
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "{}", hex::encode(v)),
            Self::Missing => write!(f, "-"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseResponseError {
    #[error(
        "Not enough bytes given. A proper frame has at least {min} bytes, got {len}.",
        min = MIN_FRAME_LENGTH
    )]
    FrameTooShort { len: usize },
}

/// An inbound frame split into its header fields and body.
///
/// Device decoders (see [`crate::devices`]) may attach a [`DeviceBody`]
/// afterwards, which is then reachable through [`Response::decoded`] and
/// [`Response::fields`].
#[derive(Clone, Debug)]
pub struct Response {
    header: [u8; HEADER_LENGTH],
    body: Vec<u8>,
    decoded: Option<DeviceBody>,
}

impl Response {
    /// Split a received frame.
    ///
    /// Only the length is checked. The flag, length field and trailing
    /// checksum are taken as they come; use [`crate::verify_checksum`] for the
    /// latter.
    pub fn parse(frame: &[u8]) -> std::result::Result<Self, ParseResponseError> {
        if frame.len() < MIN_FRAME_LENGTH {
            return Err(ParseResponseError::FrameTooShort { len: frame.len() });
        }
        let mut header = [0u8; HEADER_LENGTH];
        header.copy_from_slice(&frame[..HEADER_LENGTH]);
        Ok(Self {
            header,
            body: frame[HEADER_LENGTH..frame.len() - 1].to_vec(),
            decoded: None,
        })
    }

    pub fn header(&self) -> &[u8; HEADER_LENGTH] {
        &self.header
    }

    pub fn device_type(&self) -> u8 {
        self.header[2]
    }

    pub fn device_protocol_version(&self) -> u8 {
        self.header[8]
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_byte(self.header[9])
    }

    /// The raw body, body type byte included.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_type(&self) -> Option<u8> {
        self.body.first().copied()
    }

    /// Protocol sub-dialect reported in a querySubtype reply.
    ///
    /// `None` for every other message type. Missing bytes read as 0.
    pub fn sub_type(&self) -> Option<u16> {
        if self.message_type() != MessageType::QuerySubtype {
            return None;
        }
        Some(u16::from_le_bytes([
            read_byte(&self.body, 2),
            read_byte(&self.body, 3),
        ]))
    }

    /// Attach the device specific view of the body, replacing any earlier one.
    pub fn set_decoded(&mut self, decoded: DeviceBody) {
        self.decoded = Some(decoded);
    }

    pub fn decoded(&self) -> Option<&DeviceBody> {
        self.decoded.as_ref()
    }

    /// Named fields of the attached device body. Empty when nothing was decoded.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        self.decoded
            .as_ref()
            .map(DeviceBody::fields)
            .unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find_map(|(field, value)| (field == name).then_some(value))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "header: {}, body: {}, message type: {:02x}, body type: ",
            hex::encode(self.header),
            hex::encode(&self.body),
            self.header[9]
        )?;
        match self.body_type() {
            Some(body_type) => write!(f, "{body_type:02x}"),
            None => write!(f, "None"),
        }
    }
}

/// Byte at `offset`, or 0 if the body is shorter than that.
pub fn read_byte(body: &[u8], offset: usize) -> u8 {
    body.get(offset).copied().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::request::Request;

    #[test]
    fn too_short() {
        for len in 0..MIN_FRAME_LENGTH {
            let frame = vec![0xaa; len];
            assert_eq!(
                Response::parse(&frame).unwrap_err(),
                ParseResponseError::FrameTooShort { len }
            );
        }
    }

    #[test]
    fn header_only() {
        let bytes = [0xaa, 0x0a, 0xea, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x09];
        let response = Response::parse(&bytes).unwrap();
        assert!(response.body().is_empty());
        assert_eq!(response.body_type(), None);
        assert_eq!(response.device_type(), 0xea);
        assert_eq!(response.message_type(), MessageType::Query);
        assert!(response.fields().is_empty());
    }

    #[test]
    fn garbage_header_is_accepted() {
        let bytes = [0x00, 0xff, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0x07, 0x77, 0x41, 0x42, 0x00];
        let response = Response::parse(&bytes).unwrap();
        assert_eq!(response.device_type(), 0x12);
        assert_eq!(response.device_protocol_version(), 0x07);
        assert_eq!(response.message_type(), MessageType::Unknown(0x77));
        assert_eq!(response.body(), [0x41, 0x42]);
    }

    #[test]
    fn sub_type() {
        let frame = Request::new(
            0xac,
            0,
            MessageType::QuerySubtype,
            Some(0x00),
            vec![0x00, 0x07, 0x00, 0x10],
        )
        .serialize();
        let response = Response::parse(&frame).unwrap();
        assert_eq!(response.body()[2], 0x07);
        assert_eq!(response.sub_type(), Some(7));

        let frame = Request::new(0xac, 0, MessageType::QuerySubtype, Some(0x00), vec![0x00, 0x34, 0x12])
            .serialize();
        assert_eq!(Response::parse(&frame).unwrap().sub_type(), Some(0x1234));
    }

    #[test]
    fn short_sub_type_defaults_to_zero() {
        let frame = Request::new(0xac, 0, MessageType::QuerySubtype, Some(0x00), vec![0x01])
            .serialize();
        assert_eq!(Response::parse(&frame).unwrap().sub_type(), Some(0));

        let frame = Request::new(0xac, 0, MessageType::Query, Some(0x00), vec![0x00, 0x07, 0x00])
            .serialize();
        assert_eq!(Response::parse(&frame).unwrap().sub_type(), None);
    }

    #[test]
    fn read_byte_defaults() {
        assert_eq!(read_byte(&[1, 2, 3], 2), 3);
        assert_eq!(read_byte(&[1, 2, 3], 3), 0);
        assert_eq!(read_byte(&[], 0), 0);
    }

    #[test]
    fn display() {
        let bytes = [0xaa, 0x0b, 0xdc, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00];
        assert_eq!(
            Response::parse(&bytes).unwrap().to_string(),
            "header: aa0bdc00000000000003, body: 03, message type: 03, body type: 03"
        );
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::Bytes(vec![0x0a, 0xff, 0x00]).to_string(), "0aff00");
        assert_eq!(FieldValue::Bytes(vec![]).to_string(), "");
        assert_eq!(FieldValue::U16(0x1234).to_string(), "4660");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::Missing.to_string(), "-");
    }
}
