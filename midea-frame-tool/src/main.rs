// midea-frame-tool -- build, inspect and check appliance frames by hand.
//
// Usage:
//   midea-frame-tool decode aa1eea00000000000002...
//   midea-frame-tool decode --device-type ea "aa 1e ea 00 ..."
//   midea-frame-tool subtype 0xac
//   midea-frame-tool custom ea 03 aa55000300
//   midea-frame-tool query e1 --protocol 2
//   midea-frame-tool params b5021000010711000101
//   midea-frame-tool verify aa0bdc000000000000030313
//
// Set RUST_LOG=debug to see which body layouts were tried.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::debug;

use midea_lan_protocol::{
    MessageType,
    devices::{self, dc, e1, ea},
    new_protocol,
    request::Request,
    response::Response,
    verify_checksum,
};

/// Frame tool for the appliance LAN protocol.
#[derive(Parser)]
#[command(name = "midea-frame-tool", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a received frame and print everything that can be decoded.
    Decode {
        /// Frame bytes in hex.
        frame: String,
        /// Decode the body as this device type instead of the one in the header.
        #[arg(long, value_parser = parse_hex_u8)]
        device_type: Option<u8>,
    },
    /// Print the frame asking a device for its protocol sub-type.
    Subtype {
        #[arg(value_parser = parse_hex_u8)]
        device_type: u8,
    },
    /// Print a frame with a caller supplied body.
    Custom {
        #[arg(value_parser = parse_hex_u8)]
        device_type: u8,
        #[arg(value_parser = parse_hex_u8)]
        message_type: u8,
        /// Body bytes in hex, sent as is.
        body: String,
    },
    /// Print the status query of a device family (ea, e1, dc).
    Query {
        #[arg(value_parser = parse_hex_u8)]
        device_type: u8,
        #[arg(long, default_value_t = 0)]
        protocol: u8,
    },
    /// Decode a new-protocol parameter list body.
    Params {
        /// Body bytes in hex, body type first.
        body: String,
    },
    /// Check the trailing checksum of a frame.
    Verify {
        frame: String,
    },
}

/// Parse a hex string like "0xea" or "ea" into a u8.
fn parse_hex_u8(s: &str) -> std::result::Result<u8, String> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(s, 16).map_err(|e| format!("invalid hex byte: {e}"))
}

/// Parse hex bytes, ignoring whitespace and an optional 0x prefix.
fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&digits).with_context(|| format!("invalid hex bytes: {s:?}"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Decode { frame, device_type } => decode(&parse_hex_bytes(&frame)?, device_type)?,
        Command::Subtype { device_type } => print_request(&Request::query_subtype(device_type)),
        Command::Custom {
            device_type,
            message_type,
            body,
        } => print_request(&Request::custom(
            device_type,
            MessageType::from_byte(message_type),
            parse_hex_bytes(&body)?,
        )),
        Command::Query {
            device_type,
            protocol,
        } => print_request(&family_query(device_type, protocol)?),
        Command::Params { body } => {
            let mut params: Vec<_> = new_protocol::parse(&parse_hex_bytes(&body)?)
                .into_iter()
                .collect();
            params.sort();
            for (param, value) in params {
                println!("0x{param:04x}: {}", hex::encode(value));
            }
        }
        Command::Verify { frame } => {
            verify_checksum(&parse_hex_bytes(&frame)?)?;
            println!("checksum ok");
        }
    }
    Ok(())
}

fn decode(frame: &[u8], device_type: Option<u8>) -> Result<()> {
    let mut response = Response::parse(frame)?;
    debug!("parsed {response}");

    println!("device type:      0x{:02x}", response.device_type());
    println!("protocol version: {}", response.device_protocol_version());
    println!("message type:     {}", response.message_type());
    match response.body_type() {
        Some(body_type) => println!("body type:        0x{body_type:02x}"),
        None => println!("body type:        None"),
    }
    println!("body:             {}", hex::encode(response.body()));
    match verify_checksum(frame) {
        Ok(()) => println!("checksum:         ok"),
        Err(err) => println!("checksum:         {err}"),
    }
    if let Some(sub_type) = response.sub_type() {
        println!("sub type:         {sub_type}");
    }

    let decoded = match device_type {
        Some(device_type) => devices::decode_as(device_type, &mut response),
        None => devices::decode(&mut response),
    };
    if !decoded {
        println!("no device fields decoded");
        return Ok(());
    }
    for (name, value) in response.fields() {
        println!("  {name:<20}{value}");
    }
    Ok(())
}

fn family_query(device_type: u8, protocol: u8) -> Result<Request> {
    Ok(match device_type {
        ea::DEVICE_TYPE => ea::query(protocol),
        e1::DEVICE_TYPE => e1::query(protocol),
        dc::DEVICE_TYPE => dc::query(protocol),
        other => bail!("no status query known for device type 0x{other:02x}"),
    })
}

fn print_request(request: &Request) {
    debug!("{request}");
    println!("{}", hex::encode(request.serialize()));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_byte_arguments() {
        assert_eq!(parse_hex_u8("0xEA"), Ok(0xea));
        assert_eq!(parse_hex_u8("a0"), Ok(0xa0));
        assert!(parse_hex_u8("1ff").is_err());
    }

    #[test]
    fn hex_frames_allow_spaces() {
        assert_eq!(parse_hex_bytes("0xaa 0b\tdc").unwrap(), vec![0xaa, 0x0b, 0xdc]);
        assert_eq!(parse_hex_bytes(" AA55 ").unwrap(), vec![0xaa, 0x55]);
        assert!(parse_hex_bytes("abc").is_err());
    }

    #[test]
    fn queries_for_known_families() {
        assert_eq!(family_query(0xea, 1).unwrap(), ea::query(1));
        assert_eq!(family_query(0xdc, 0).unwrap().serialize()[2], 0xdc);
        assert!(family_query(0xac, 0).is_err());
    }

    #[test]
    fn decode_rejects_short_frames() {
        assert!(decode(&[0xaa, 0x0b], None).is_err());
        let frame = dc::query(0).serialize();
        assert!(decode(&frame, None).is_ok());
    }
}
