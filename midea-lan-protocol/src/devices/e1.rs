//! E1, dishwashers.

use crate::{
    MessageType,
    devices::{DeviceBody, DeviceDecoder, Probe, ProtocolGeneration, VariantRule, select_shape},
    request::Request,
    response::{FieldValue, Response, read_byte},
};

pub const DEVICE_TYPE: u8 = 0xe1;

const BODY_TYPE_POWER: u8 = 0x08;
const BODY_TYPE_LOCK: u8 = 0x83;
const BODY_TYPE_STORAGE: u8 = 0x81;
const BODY_TYPE_QUERY: u8 = 0x00;

pub const RULES: &[VariantRule<()>] = &[
    VariantRule {
        generation: ProtocolGeneration::Any,
        message_types: &[MessageType::Set],
        probes: &[Probe::Range {
            offset: 0,
            min: 0x00,
            max: 0x07,
        }],
        shape: (),
    },
    VariantRule {
        generation: ProtocolGeneration::Any,
        message_types: &[MessageType::Query, MessageType::Notify1],
        probes: &[Probe::Byte {
            offset: 0,
            value: 0x00,
        }],
        shape: (),
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct E1Body {
    pub power: bool,
    pub status: u8,
    pub mode: u8,
    pub additional: u8,
    pub door_closed: bool,
    pub rinse_aid: bool,
    pub salt: bool,
    /// Only reported while starting, pausing, or in status 2 and 3.
    pub start: Option<bool>,
    pub child_lock: bool,
    pub uv: bool,
    pub dry: bool,
    pub dry_status: bool,
    pub storage: bool,
    pub storage_status: bool,
    pub time_remaining: u8,
    pub progress: u8,
    pub storage_remaining: Option<u8>,
    pub temperature: u8,
    pub humidity: Option<u8>,
    pub water_switch: bool,
    pub water_lack: bool,
    pub error_code: u8,
    pub softwater: u8,
    pub wrong_operation: u8,
    pub bright: u8,
}

impl E1Body {
    pub fn decode(body: &[u8]) -> Self {
        let status = read_byte(body, 1);
        let features = read_byte(body, 4);
        let flags = read_byte(body, 5);
        let start = if flags & 0x08 != 0 {
            Some(true)
        } else if matches!(status, 2 | 3) {
            Some(false)
        } else {
            None
        };
        Self {
            power: status > 0,
            status,
            mode: read_byte(body, 2),
            additional: read_byte(body, 3),
            door_closed: flags & 0x01 == 0,
            rinse_aid: flags & 0x02 != 0,
            salt: flags & 0x04 != 0,
            start,
            child_lock: flags & 0x10 != 0,
            uv: features & 0x02 != 0,
            dry: features & 0x10 != 0,
            dry_status: features & 0x20 != 0,
            storage: flags & 0x20 != 0,
            storage_status: flags & 0x40 != 0,
            time_remaining: read_byte(body, 6),
            progress: read_byte(body, 9),
            storage_remaining: body.get(18).copied(),
            temperature: read_byte(body, 11),
            humidity: body.get(33).copied(),
            water_switch: features & 0x04 != 0,
            water_lack: flags & 0x80 != 0,
            error_code: read_byte(body, 10),
            softwater: read_byte(body, 13),
            wrong_operation: read_byte(body, 16),
            bright: read_byte(body, 24),
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let optional = |value: Option<u8>| value.map_or(FieldValue::Missing, FieldValue::U8);
        vec![
            ("power", FieldValue::Bool(self.power)),
            ("status", FieldValue::U8(self.status)),
            ("mode", FieldValue::U8(self.mode)),
            ("additional", FieldValue::U8(self.additional)),
            ("door_closed", FieldValue::Bool(self.door_closed)),
            ("rinse_aid", FieldValue::Bool(self.rinse_aid)),
            ("salt", FieldValue::Bool(self.salt)),
            ("start", self.start.map_or(FieldValue::Missing, FieldValue::Bool)),
            ("child_lock", FieldValue::Bool(self.child_lock)),
            ("uv", FieldValue::Bool(self.uv)),
            ("dry", FieldValue::Bool(self.dry)),
            ("dry_status", FieldValue::Bool(self.dry_status)),
            ("storage", FieldValue::Bool(self.storage)),
            ("storage_status", FieldValue::Bool(self.storage_status)),
            ("time_remaining", FieldValue::U8(self.time_remaining)),
            ("progress", FieldValue::U8(self.progress)),
            ("storage_remaining", optional(self.storage_remaining)),
            ("temperature", FieldValue::U8(self.temperature)),
            ("humidity", optional(self.humidity)),
            ("water_switch", FieldValue::Bool(self.water_switch)),
            ("water_lack", FieldValue::Bool(self.water_lack)),
            ("error_code", FieldValue::U8(self.error_code)),
            ("softwater", FieldValue::U8(self.softwater)),
            ("wrong_operation", FieldValue::U8(self.wrong_operation)),
            ("bright", FieldValue::U8(self.bright)),
        ]
    }
}

pub struct E1;

impl DeviceDecoder for E1 {
    const DEVICE_TYPE: u8 = DEVICE_TYPE;

    fn decode_body(response: &Response) -> Option<DeviceBody> {
        select_shape(
            RULES,
            response.device_protocol_version(),
            response.message_type(),
            response.body(),
        )?;
        Some(DeviceBody::E1(E1Body::decode(response.body())))
    }
}

pub fn power(device_protocol_version: u8, on: bool) -> Request {
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_POWER),
        vec![on as u8, 0x00, 0x00, 0x00],
    )
}

pub fn lock(device_protocol_version: u8, locked: bool) -> Request {
    let mut payload = vec![if locked { 0x03 } else { 0x04 }];
    payload.extend([0x00; 36]);
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_LOCK),
        payload,
    )
}

pub fn storage(device_protocol_version: u8, on: bool) -> Request {
    let mut payload = vec![0x00, 0x00, 0x00, on as u8];
    payload.extend([0xff; 6]);
    payload.extend([0x00; 27]);
    Request::new(
        DEVICE_TYPE,
        device_protocol_version,
        MessageType::Set,
        Some(BODY_TYPE_STORAGE),
        payload,
    )
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
