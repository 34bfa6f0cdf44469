//! Decoding OSC datagrams into relay messages.
//!
//! A datagram holds either one message or a bundle of packets. Bundles are
//! flattened depth-first so their messages relay in the order they were
//! packed. Each message then contributes its address and its first
//! argument; everything after the first argument is ignored.

use crate::error::DecodeError;
use crate::message::{RelayMessage, RelayValue};
use rosc::{OscMessage, OscPacket, OscType};

/// Outcome of decoding one datagram.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedPacket {
    /// Messages ready to relay, in packet order.
    pub messages: Vec<RelayMessage>,
    /// Messages inside the packet that were dropped, with the reason.
    pub skipped: Vec<DecodeError>,
}

/// Decode a raw UDP datagram.
///
/// Returns `Err` only when the bytes are not OSC at all. A well-formed packet
/// whose messages cannot be relayed yields an `Ok` with those messages listed
/// in [`DecodedPacket::skipped`].
pub fn decode_packet(bytes: &[u8]) -> Result<DecodedPacket, DecodeError> {
    let (_, packet) =
        rosc::decoder::decode_udp(bytes).map_err(|e| DecodeError::Malformed(format!("{:?}", e)))?;

    let mut decoded = DecodedPacket::default();
    collect(packet, &mut decoded);
    Ok(decoded)
}

fn collect(packet: OscPacket, out: &mut DecodedPacket) {
    match packet {
        OscPacket::Message(msg) => match extract_message(&msg) {
            Ok(relay) => out.messages.push(relay),
            Err(err) => out.skipped.push(err),
        },
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                collect(inner, out);
            }
        }
    }
}

/// Build a relay message from an OSC message's address and first argument.
pub fn extract_message(msg: &OscMessage) -> Result<RelayMessage, DecodeError> {
    let arg = msg
        .args
        .first()
        .ok_or_else(|| DecodeError::MissingArgument(msg.addr.clone()))?;

    let value = match *arg {
        OscType::Int(v) => RelayValue::Int(v),
        OscType::Long(v) => RelayValue::Long(v),
        OscType::Float(v) => RelayValue::Float(v),
        OscType::Double(v) => RelayValue::Double(v),
        ref other => {
            return Err(DecodeError::NonNumeric {
                address: msg.addr.clone(),
                kind: type_name(other),
            })
        }
    };

    if !value.is_finite() {
        return Err(DecodeError::NonFinite(msg.addr.clone()));
    }

    Ok(RelayMessage {
        address: msg.addr.clone(),
        value,
    })
}

fn type_name(arg: &OscType) -> &'static str {
    match arg {
        OscType::String(_) => "string",
        OscType::Blob(_) => "blob",
        OscType::Bool(_) => "bool",
        OscType::Char(_) => "char",
        OscType::Time(_) => "timetag",
        OscType::Nil => "nil",
        OscType::Inf => "inf",
        OscType::Array(_) => "array",
        _ => "other",
    }
}
