use log::warn;

use crate::{FRAME_FLAG, HEADER_LENGTH, MessageType, checksum};

/// Body of an outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// The usual shape: an optional body type byte followed by the payload.
    Typed {
        body_type: Option<u8>,
        payload: Vec<u8>,
    },
    /// A body the caller already assembled. Sent as is.
    Raw(Vec<u8>),
}

impl RequestBody {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Typed { body_type, payload } => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.extend(body_type);
                out.extend_from_slice(payload);
                out
            }
            Self::Raw(body) => body.clone(),
        }
    }

    pub fn body_type(&self) -> Option<u8> {
        match self {
            Self::Typed { body_type, .. } => *body_type,
            Self::Raw(_) => None,
        }
    }
}

/// An outbound command.
///
/// Fields are public and nothing is cached, so a request may be tweaked
/// between calls to [`Request::serialize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub device_type: u8,
    pub device_protocol_version: u8,
    pub message_type: MessageType,
    pub body: RequestBody,
}

impl Request {
    pub fn new(
        device_type: u8,
        device_protocol_version: u8,
        message_type: MessageType,
        body_type: Option<u8>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            device_type,
            device_protocol_version,
            message_type,
            body: RequestBody::Typed { body_type, payload },
        }
    }

    /// Asks the device which protocol sub-dialect it speaks.
    pub fn query_subtype(device_type: u8) -> Self {
        Self::new(
            device_type,
            0,
            MessageType::QuerySubtype,
            Some(0x00),
            vec![0x00; 18],
        )
    }

    /// A request whose body is sent verbatim, with no body type byte prepended.
    pub fn custom(device_type: u8, message_type: MessageType, body: Vec<u8>) -> Self {
        Self {
            device_type,
            device_protocol_version: 0,
            message_type,
            body: RequestBody::Raw(body),
        }
    }

    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.to_bytes()
    }

    pub fn header(&self) -> [u8; HEADER_LENGTH] {
        self.header_for(self.body_bytes().len())
    }

    fn header_for(&self, body_len: usize) -> [u8; HEADER_LENGTH] {
        let length = HEADER_LENGTH + body_len;
        if length > u8::MAX as usize {
            // the length field is one byte wide, the device will see a wrapped value
            warn!(
                "request for device 0x{:02x} is {length} bytes long, length field overflows",
                self.device_type
            );
        }
        [
            FRAME_FLAG,
            length as u8,
            self.device_type,
            // frame checksum, never filled in
            0x00,
            // reserved
            0x00,
            0x00,
            // frame id
            0x00,
            // frame protocol version
            0x00,
            self.device_protocol_version,
            self.message_type.as_byte(),
        ]
    }

    /// Build the bytes to put on the wire.
    ///
    /// Frame format:
    ///
    /// - FRAME_FLAG (0xaa)
    /// - Length of header + body (the checksum is not counted)
    /// - Device type
    /// - Frame checksum (always 0)
    /// - 2 reserved bytes
    /// - Frame id
    /// - Frame protocol version
    /// - Device protocol version
    /// - Message type ([`MessageType`])
    /// - N bytes of body (first being the body type, if any)
    /// - Checksum over everything but the flag
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.body_bytes();
        let mut out = Vec::with_capacity(HEADER_LENGTH + body.len() + 1);
        out.extend(self.header_for(body.len()));
        out.extend(body);
        out.push(checksum(&out[1..]));
        out
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let body = self.body_bytes();
        write!(
            f,
            "header: {}, body: {}, message type: {:02x}, body type: ",
            hex::encode(self.header_for(body.len())),
            hex::encode(&body),
            self.message_type.as_byte()
        )?;
        match self.body.body_type() {
            Some(body_type) => write!(f, "{body_type:02x}"),
            None => write!(f, "None"),
        }
    }
}
