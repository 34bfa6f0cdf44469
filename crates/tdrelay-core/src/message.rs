//! The relay message forwarded from OSC to browsers.

use serde::Serialize;
use std::fmt;

/// Event name under which relayed OSC data reaches browser clients.
pub const TD_DATA_EVENT: &str = "td-data";

/// Numeric OSC argument, kept in its wire type.
///
/// Keeping `f32` as `f32` matters for the browser: `0.42f32` widened to
/// `f64` prints as `0.41999998688697815`, while serializing the `f32`
/// directly yields `0.42`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelayValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl RelayValue {
    /// The value as `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            RelayValue::Int(v) => v as f64,
            RelayValue::Long(v) => v as f64,
            RelayValue::Float(v) => v as f64,
            RelayValue::Double(v) => v,
        }
    }

    pub fn is_finite(&self) -> bool {
        match *self {
            RelayValue::Int(_) | RelayValue::Long(_) => true,
            RelayValue::Float(v) => v.is_finite(),
            RelayValue::Double(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for RelayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayValue::Int(v) => write!(f, "{}", v),
            RelayValue::Long(v) => write!(f, "{}", v),
            RelayValue::Float(v) => write!(f, "{}", v),
            RelayValue::Double(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for RelayValue {
    fn from(v: i32) -> Self {
        RelayValue::Int(v)
    }
}

impl From<i64> for RelayValue {
    fn from(v: i64) -> Self {
        RelayValue::Long(v)
    }
}

impl From<f32> for RelayValue {
    fn from(v: f32) -> Self {
        RelayValue::Float(v)
    }
}

impl From<f64> for RelayValue {
    fn from(v: f64) -> Self {
        RelayValue::Double(v)
    }
}

/// One OSC address/value pair on its way to the browsers.
///
/// Serializes as `{"address": "/pinch", "value": 0.42}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayMessage {
    pub address: String,
    pub value: RelayValue,
}

impl RelayMessage {
    pub fn new(address: impl Into<String>, value: impl Into<RelayValue>) -> Self {
        Self {
            address: address.into(),
            value: value.into(),
        }
    }
}
