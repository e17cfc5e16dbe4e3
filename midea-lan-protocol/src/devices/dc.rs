//! DC, clothes dryers.

use crate::{
    MessageType,
    devices::{DeviceBody, DeviceDecoder, Probe, ProtocolGeneration, VariantRule, select_shape},
    request::Request,
    response::{FieldValue, Response, read_byte},
};

pub const DEVICE_TYPE: u8 = 0xdc;

const BODY_TYPE_QUERY: u8 = 0x03;
const BODY_TYPE_SET: u8 = 0x02;

pub const RULES: &[VariantRule<()>] = &[
    VariantRule {
        generation: ProtocolGeneration::Any,
        message_types: &[MessageType::Query, MessageType::Set],
        probes: &[],
        shape: (),
    },
    VariantRule {
        generation: ProtocolGeneration::Any,
        message_types: &[MessageType::Notify1],
        probes: &[Probe::Byte {
            offset: 0,
            value: 0x04,
        }],
        shape: (),
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DcBody {
    pub power: bool,
    pub start: bool,
    /// Program settings. Pass them to [`start`] to run the same program.
    pub washing_data: Vec<u8>,
    /// Stage number, 0 when idle.
    pub progress: u8,
    /// Minutes. Not reported while powered off.
    pub time_remaining: Option<u16>,
}

impl DcBody {
    pub fn decode(body: &[u8]) -> Self {
        let power = read_byte(body, 1) > 0;
        let stages = read_byte(body, 16);
        let progress = (0..7u8)
            .find(|bit| stages & (1u8 << bit) != 0)
            .map_or(0, |bit| bit + 1);
        let washing_data = body
            .get(3..body.len().min(15))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        Self {
            power,
            start: matches!(read_byte(body, 2), 2 | 6),
            washing_data,
            progress,
            time_remaining: power
                .then(|| read_byte(body, 17) as u16 + read_byte(body, 18) as u16 * 60),
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("power", FieldValue::Bool(self.power)),
            ("start", FieldValue::Bool(self.start)),
            ("washing_data", FieldValue::Bytes(self.washing_data.clone())),
            ("progress", FieldValue::U8(self.progress)),
            (
                "time_remaining",
                self.time_remaining.map_or(FieldValue::Missing, FieldValue::U16),
            ),
        ]
    }
}

pub struct Dc;

impl DeviceDecoder for Dc {
    const DEVICE_TYPE: u8 = DEVICE_TYPE;

    fn decode_body(response: &Response) -> Option<DeviceBody> {
        select_shape(
            RULES,
            response.device_protocol_version(),
            response.message_type(),
            response.body(),
        )?;
        Some(DeviceBody::Dc(DcBody::decode(response.body())))
    }
}

pub fn query(device_protocol_version: u8) -> Request {
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Query,
        Some(BODY_TYPE_QUERY),
        vec![],
    )
}

pub fn power(device_protocol_version: u8, on: bool) -> Request {
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_SET),
        vec![on as u8, 0xff],
    )
}

/// Start a program. `washing_data` is the settings block as reported in
/// [`DcBody::washing_data`].
pub fn start(device_protocol_version: u8, washing_data: &[u8]) -> Request {
    let mut payload = vec![0xff, 0x01];
    payload.extend_from_slice(washing_data);
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_SET),
        payload,
    )
}

pub fn stop(device_protocol_version: u8) -> Request {
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_SET),
        vec![0xff, 0x00],
    )
}
