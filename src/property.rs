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

//! Property schemas and value normalization.
//!
//! Each entity kind has a closed, ordered schema: the attribute name that
//! appears in reports, how to normalize it, and how to read it. Nothing
//! outside the schema is ever compared.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{Message, Number, Signal};

/// How a raw attribute is turned into the value that gets compared and
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    PassThrough,
    /// Lowercase `0x` hex string.
    Hex,
    Stringified,
    /// Comma joined. Reordering counts as a change.
    ListJoin,
    /// Integer code to label, sorted by code.
    ChoiceMap,
}

/// An attribute as read off an entity, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Absent,
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<String>),
    Choices(Vec<(Number, String)>),
}

impl RawValue {
    fn from_option<T>(value: Option<T>, wrap: impl FnOnce(T) -> RawValue) -> RawValue {
        value.map(wrap).unwrap_or(RawValue::Absent)
    }
}

/// A normalized attribute value as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Normalized {
    Bool(bool),
    Number(Number),
    Text(String),
    Choices(BTreeMap<i64, String>),
}

impl Normalization {
    pub fn apply(self, raw: RawValue) -> Option<Normalized> {
        match (self, raw) {
            (_, RawValue::Absent) => None,
            (Normalization::Hex, RawValue::Number(number)) => match number.as_i64() {
                Some(value) => Some(Normalized::Text(format_hex(value))),
                None => Some(Normalized::Text(number.to_string())),
            },
            (Normalization::Stringified, raw) => Some(Normalized::Text(stringify(raw))),
            (Normalization::ListJoin, RawValue::List(items)) => {
                Some(Normalized::Text(items.join(",")))
            }
            (Normalization::ChoiceMap, RawValue::Choices(choices)) => {
                Some(Normalized::Choices(sorted_choices(choices)))
            }
            (_, raw) => Some(pass_through(raw)),
        }
    }
}

fn format_hex(value: i64) -> String {
    if value < 0 {
        format!("-{:#x}", value.unsigned_abs())
    } else {
        format!("{:#x}", value)
    }
}

fn stringify(raw: RawValue) -> String {
    match raw {
        RawValue::Absent => String::new(),
        RawValue::Bool(value) => value.to_string(),
        RawValue::Number(number) => number.to_string(),
        RawValue::Text(text) => text,
        RawValue::List(items) => items.join(","),
        RawValue::Choices(choices) => sorted_choices(choices)
            .iter()
            .map(|(code, label)| format!("{}: {}", code, label))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn sorted_choices(choices: Vec<(Number, String)>) -> BTreeMap<i64, String> {
    choices
        .into_iter()
        .map(|(code, label)| (code.as_i64().unwrap_or(code.as_f64() as i64), label))
        .collect()
}

fn pass_through(raw: RawValue) -> Normalized {
    match raw {
        RawValue::Bool(value) => Normalized::Bool(value),
        RawValue::Number(number) => Normalized::Number(number),
        RawValue::Text(text) => Normalized::Text(text),
        RawValue::List(items) => Normalized::Text(items.join(",")),
        RawValue::Choices(choices) => Normalized::Choices(sorted_choices(choices)),
        RawValue::Absent => Normalized::Text(String::new()),
    }
}

/// One schema entry.
pub struct Property<T> {
    pub name: &'static str,
    pub kind: Normalization,
    pub read: fn(&T) -> RawValue,
}

impl<T> Property<T> {
    pub fn normalized(&self, entity: &T) -> Option<Normalized> {
        self.kind.apply((self.read)(entity))
    }
}

pub const MESSAGE_PROPERTIES: &[Property<Message>] = &[
    Property {
        name: "frame_id",
        kind: Normalization::Hex,
        read: |m| RawValue::Number(Number::Int(i64::from(m.frame_id))),
    },
    Property {
        name: "is_extended_frame",
        kind: Normalization::PassThrough,
        read: |m| RawValue::Bool(m.is_extended_frame),
    },
    Property {
        name: "is_fd",
        kind: Normalization::PassThrough,
        read: |m| RawValue::Bool(m.is_fd),
    },
    Property {
        name: "length",
        kind: Normalization::PassThrough,
        read: |m| RawValue::Number(Number::Int(m.length as i64)),
    },
    Property {
        name: "send_type",
        kind: Normalization::PassThrough,
        read: |m| RawValue::from_option(m.send_type.clone(), RawValue::Text),
    },
    Property {
        name: "cycle_time",
        kind: Normalization::PassThrough,
        read: |m| RawValue::from_option(m.cycle_time, |v| RawValue::Number(Number::Int(v))),
    },
    Property {
        name: "senders",
        kind: Normalization::ListJoin,
        read: |m| RawValue::List(m.senders.clone()),
    },
    Property {
        name: "receivers",
        kind: Normalization::ListJoin,
        read: |m| RawValue::List(m.receivers.clone()),
    },
];

pub const SIGNAL_PROPERTIES: &[Property<Signal>] = &[
    Property {
        name: "minimum",
        kind: Normalization::PassThrough,
        read: |s| RawValue::from_option(s.minimum, RawValue::Number),
    },
    Property {
        name: "maximum",
        kind: Normalization::PassThrough,
        read: |s| RawValue::from_option(s.maximum, RawValue::Number),
    },
    Property {
        name: "start",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Number(Number::Int(s.start as i64)),
    },
    Property {
        name: "length",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Number(Number::Int(s.length as i64)),
    },
    Property {
        name: "byte_order",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Text(s.byte_order.as_str().to_string()),
    },
    Property {
        name: "is_signed",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Bool(s.is_signed),
    },
    Property {
        name: "initial",
        kind: Normalization::Stringified,
        read: |s| RawValue::from_option(s.initial, RawValue::Number),
    },
    Property {
        name: "invalid",
        kind: Normalization::PassThrough,
        read: |s| RawValue::from_option(s.invalid, RawValue::Number),
    },
    Property {
        name: "unit",
        kind: Normalization::PassThrough,
        read: |s| RawValue::from_option(s.unit.clone(), RawValue::Text),
    },
    Property {
        name: "scale",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Number(s.scale),
    },
    Property {
        name: "offset",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Number(s.offset),
    },
    Property {
        name: "is_float",
        kind: Normalization::PassThrough,
        read: |s| RawValue::Bool(s.is_float),
    },
    Property {
        name: "choices",
        kind: Normalization::ChoiceMap,
        read: |s| RawValue::from_option(s.choices.clone(), RawValue::Choices),
    },
    Property {
        name: "spn",
        kind: Normalization::PassThrough,
        read: |s| RawValue::from_option(s.spn, |v| RawValue::Number(Number::Int(v))),
    },
];

/// A single differing attribute. `None` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDelta {
    pub name: &'static str,
    pub old: Option<Normalized>,
    pub new: Option<Normalized>,
}

/// Attributes whose normalized values differ, in schema order.
pub fn compare_properties<T>(old: &T, new: &T, schema: &[Property<T>]) -> Vec<PropertyDelta> {
    schema
        .iter()
        .filter_map(|property| {
            let old_value = property.normalized(old);
            let new_value = property.normalized(new);
            if old_value != new_value {
                Some(PropertyDelta {
                    name: property.name,
                    old: old_value,
                    new: new_value,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Every attribute that has a value, in schema order.
pub fn present_properties<T>(
    entity: &T,
    schema: &[Property<T>],
) -> Vec<(&'static str, Normalized)> {
    schema
        .iter()
        .filter_map(|property| property.normalized(entity).map(|value| (property.name, value)))
        .collect()
}
