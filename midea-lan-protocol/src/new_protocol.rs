//! The parameter-list body used by newer firmware.
//!
//! ```text
//! [body type][count] then `count` entries of either
//!   [param lo][param hi][len][value..]        (body type 0xb5)
//!   [param lo][param hi][0x00][len][value..]  (anything else)
//! ```

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

/// Body type which selects the short entry prefix.
pub const SHORT_PREFIX_BODY_TYPE: u8 = 0xb5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackLength {
    /// `[id lo][id hi][len]`
    Short = 4,
    /// `[id lo][id hi][0x00][len]`
    Long = 5,
}

impl PackLength {
    pub fn for_body_type(body_type: u8) -> Self {
        if body_type == SHORT_PREFIX_BODY_TYPE {
            Self::Short
        } else {
            Self::Long
        }
    }
}

#[derive(Debug, Error)]
pub enum NewProtocolError {
    #[error("body ran out at offset {offset} after {decoded} entries")]
    Truncated { offset: usize, decoded: usize },
}

pub type Params = HashMap<u16, Vec<u8>>;

/// Encode one entry.
///
/// The length field is a single byte. Longer values are still written out
/// in full, but their length wraps.
pub fn pack(param: u16, value: &[u8], pack_len: PackLength) -> Vec<u8> {
    if value.len() > u8::MAX as usize {
        warn!(
            "Value of parameter 0x{param:04x} is {} bytes, the length field only holds {}",
            value.len(),
            u8::MAX
        );
    }
    let [lo, hi] = param.to_le_bytes();
    let mut out = Vec::with_capacity(value.len() + 4);
    out.push(lo);
    out.push(hi);
    if pack_len == PackLength::Long {
        out.push(0x00);
    }
    out.push(value.len() as u8);
    out.extend_from_slice(value);
    out
}

/// Decode the entries of a new-protocol body.
///
/// Never fails. Some devices send non-standard bodies; in that case every
/// entry read before the body ran out is returned and the raw bytes are logged.
pub fn parse(body: &[u8]) -> Params {
    let mut params = Params::new();
    if let Err(err) = parse_into(body, &mut params) {
        debug!("Non-standard new-protocol body ({err}): {}", hex::encode(body));
    }
    params
}

fn parse_into(body: &[u8], params: &mut Params) -> std::result::Result<(), NewProtocolError> {
    let Some(&body_type) = body.first() else {
        return Err(NewProtocolError::Truncated {
            offset: 0,
            decoded: 0,
        });
    };
    let pack_len = PackLength::for_body_type(body_type);
    let count = *body.get(1).ok_or(NewProtocolError::Truncated {
        offset: 1,
        decoded: 0,
    })?;

    let mut pos = 2;
    for decoded in 0..count as usize {
        let truncated = NewProtocolError::Truncated {
            offset: pos,
            decoded,
        };
        let (Some(&lo), Some(&hi)) = (body.get(pos), body.get(pos + 1)) else {
            return Err(truncated);
        };
        let param = u16::from_le_bytes([lo, hi]);
        if pack_len == PackLength::Long {
            pos += 1;
        }
        let len = *body.get(pos + 2).ok_or(truncated)? as usize;
        if len > 0 {
            // a value cut short by the end of the body is kept as far as it goes
            let end = body.len().min(pos + 3 + len);
            let value = body.get(pos + 3..end).unwrap_or_default();
            params.insert(param, value.to_vec());
        }
        pos += 3 + len;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_short_and_long() {
        assert_eq!(
            pack(0x0213, &[0x01, 0x02], PackLength::Short),
            vec![0x13, 0x02, 0x02, 0x01, 0x02]
        );
        assert_eq!(
            pack(0x0213, &[0x01], PackLength::Long),
            vec![0x13, 0x02, 0x00, 0x01, 0x01]
        );
    }

    #[test]
    fn parse_short_prefix() {
        let body = [0xb5, 0x02, 0x10, 0x00, 0x01, 0x07, 0x1a, 0x02, 0x02, 0xab, 0xcd];
        let params = parse(&body);
        assert_eq!(params.len(), 2);
        assert_eq!(params[&0x0010u16], vec![0x07]);
        assert_eq!(params[&0x021au16], vec![0xab, 0xcd]);
    }

    #[test]
    fn parse_long_prefix() {
        let body = [0xb1, 0x02, 0x15, 0x00, 0x00, 0x01, 0x01, 0x1a, 0x00, 0x00, 0x01, 0x30];
        let params = parse(&body);
        assert_eq!(params.len(), 2);
        assert_eq!(params[&0x0015u16], vec![0x01]);
        assert_eq!(params[&0x001au16], vec![0x30]);
    }

    #[test]
    fn parse_what_pack_built() {
        let entries: Vec<(u16, Vec<u8>)> = vec![
            (0x0001, vec![0x01]),
            (0x0230, vec![0x10, 0x20, 0x30]),
            (0xff00, vec![0x00, 0x00]),
        ];
        for (body_type, pack_len) in [(0xb5, PackLength::Short), (0xb0, PackLength::Long)] {
            let mut body = vec![body_type, entries.len() as u8];
            for (param, value) in &entries {
                body.extend(pack(*param, value, pack_len));
            }
            let params = parse(&body);
            assert_eq!(params.len(), entries.len());
            for (param, value) in &entries {
                assert_eq!(&params[param], value);
            }
        }
    }

    #[test]
    fn zero_length_entries_are_skipped() {
        let body = [0xb5, 0x02, 0x01, 0x00, 0x00, 0x02, 0x00, 0x01, 0x05];
        let params = parse(&body);
        assert_eq!(params.len(), 1);
        assert_eq!(params[&0x0002u16], vec![0x05]);
    }

    #[test]
    fn later_duplicates_win() {
        let body = [0xb5, 0x02, 0x01, 0x00, 0x01, 0x05, 0x01, 0x00, 0x01, 0x06];
        assert_eq!(parse(&body)[&0x0001u16], vec![0x06]);
    }

    #[test]
    fn truncated_body_keeps_what_was_read() {
        // claims three entries, only carries one and a half
        let body = [0xb5, 0x03, 0x10, 0x00, 0x01, 0x07, 0x11, 0x00, 0x04, 0x01];
        let params = parse(&body);
        assert_eq!(params.len(), 2);
        assert_eq!(params[&0x0010u16], vec![0x07]);
        assert_eq!(params[&0x0011u16], vec![0x01]);

        let mut partial = Params::new();
        assert!(matches!(
            parse_into(&body, &mut partial),
            Err(NewProtocolError::Truncated { decoded: 2, .. })
        ));
    }

    #[test]
    fn value_cut_at_its_length_byte() {
        let body = [0xb5, 0x02, 0x10, 0x00, 0x01, 0x07, 0x11, 0x00, 0x03];
        let params = parse(&body);
        assert_eq!(params.len(), 2);
        assert_eq!(params[&0x0011u16], Vec::<u8>::new());
    }

    #[test]
    fn pack_oversized_value_wraps_length() {
        let value = vec![0x5a; 256];
        let entry = pack(0x0001, &value, PackLength::Short);
        assert_eq!(entry.len(), 3 + 256);
        assert_eq!(entry[2], 0x00);
        assert_eq!(&entry[3..], &value[..]);
    }

    #[test]
    fn empty_bodies() {
        assert!(parse(&[]).is_empty());
        assert!(parse(&[0xb5]).is_empty());
        assert!(parse(&[0xb5, 0x00]).is_empty());
    }
}
