// dbc-diff is a tool for comparing CAN database files
// Copyright (C) 2025  Peoples Grocers LLC
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// To purchase a license under different terms contact admin@peoplesgrocers.com
// To request changes, report bugs, or give user feedback contact
// marxism@peoplesgrocers.com
//

//! In-memory view of a parsed DBC file.
//!
//! A [`Catalog`] is produced once by the reader and never mutated afterwards.
//! Messages and signals are keyed by name because names are what the diff
//! joins on; frame ids are just another property that can change.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub const UNKNOWN_VERSION: &str = "unknown";

/// A DBC number. Integers stay integers so `5` and `5.0` print the way they
/// were written, but both compare equal.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Integer literal if it fits, float otherwise.
    pub fn parse(text: &str) -> Option<Number> {
        if let Ok(value) = text.parse::<i64>() {
            return Some(Number::Int(value));
        }
        let value = text.parse::<f64>().ok()?;
        if value.is_finite() {
            Some(Number::Float(value))
        } else {
            None
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(v as i64),
            Number::Float(_) => None,
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    /// `raw * scale + offset`, staying integral when every operand is.
    pub fn scaled(self, scale: Number, offset: Number) -> Number {
        match (self, scale, offset) {
            (Number::Int(raw), Number::Int(scale), Number::Int(offset)) => raw
                .checked_mul(scale)
                .and_then(|v| v.checked_add(offset))
                .map(Number::Int)
                .unwrap_or_else(|| {
                    Number::Float(raw as f64 * scale as f64 + offset as f64)
                }),
            _ => Number::Float(self.as_f64() * scale.as_f64() + offset.as_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Float(v) if *v != 0.0 && (v.abs() < 1e-4 || v.abs() >= 1e16) => {
                f.write_str(&exponent_form(*v))
            }
            Number::Float(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// `1e-05`, `1.5e+16`: signed exponent padded to two digits.
fn exponent_form(value: f64) -> String {
    let text = format!("{:e}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::Int(v) => serializer.serialize_i64(*v),
            Number::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "little_endian",
            ByteOrder::BigEndian => "big_endian",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub start: u64,
    pub length: u64,
    pub byte_order: ByteOrder,
    pub is_signed: bool,
    pub initial: Option<Number>,
    pub invalid: Option<Number>,
    pub unit: Option<String>,
    pub scale: Number,
    pub offset: Number,
    pub is_float: bool,
    /// Value descriptions in file order. Later duplicates of a code win.
    pub choices: Option<Vec<(Number, String)>>,
    pub spn: Option<i64>,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            minimum: None,
            maximum: None,
            start: 0,
            length: 0,
            byte_order: ByteOrder::LittleEndian,
            is_signed: false,
            initial: None,
            invalid: None,
            unit: None,
            scale: Number::Int(1),
            offset: Number::Int(0),
            is_float: false,
            choices: None,
            spn: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Frame id without the extended-frame flag bit.
    pub frame_id: u32,
    pub is_extended_frame: bool,
    pub is_fd: bool,
    pub length: u64,
    pub send_type: Option<String>,
    pub cycle_time: Option<i64>,
    pub senders: Vec<String>,
    pub receivers: Vec<String>,
    pub signals: BTreeMap<String, Signal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub messages: BTreeMap<String, Message>,
    pub version: Option<String>,
}

impl Catalog {
    /// The version string, or `"unknown"` when the file has none.
    pub fn version_label(&self) -> &str {
        match self.version.as_deref() {
            Some(version) if !version.is_empty() => version,
            _ => UNKNOWN_VERSION,
        }
    }
}
