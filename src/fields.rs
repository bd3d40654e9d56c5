/*******************************************************************************
*   (c) 2018 - 2023 ZondaX AG
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! Presence checks and typed accessors over raw, loosely-typed records
#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]

use std::convert::TryFrom;

use serde_json::{Map, Value};

use crate::errors::BuildError;

/// Externally supplied record (one input, one output or one transaction)
pub type RawRecord = Map<String, Value>;

/// Name of a record field, together with the alternative spellings it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    aliases: &'static [&'static str],
}

impl Field {
    /// Field with a single accepted spelling
    pub const fn new(name: &'static str) -> Self {
        Field { name, aliases: &[] }
    }

    /// Field that is also accepted under `aliases`
    pub const fn with_aliases(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Field { name, aliases }
    }

    /// Canonical name, used in error messages
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// First non-null value stored under any accepted spelling
    pub fn lookup<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .filter_map(|key| record.get(key))
            .find(|value| !value.is_null())
    }

    /// True when the field holds a non-null value
    pub fn is_present(&self, record: &RawRecord) -> bool {
        self.lookup(record).is_some()
    }
}

/// Checks that every field in `fields` maps to a non-null value.
///
/// Only presence is checked, never type or range.
pub fn require_fields(record: &RawRecord, fields: &[Field]) -> Result<(), BuildError> {
    match fields.iter().find(|field| !field.is_present(record)) {
        Some(field) => Err(BuildError::MissingField(field.name)),
        None => Ok(()),
    }
}

/// String value of `field`, if present
pub fn get_str(record: &RawRecord, field: Field) -> Result<Option<&str>, BuildError> {
    match field.lookup(record) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(BuildError::InvalidField {
            field: field.name,
            expected: "a string",
        }),
    }
}

/// Unsigned integer value of `field`, given either as a JSON number or as decimal text
pub fn get_u64(record: &RawRecord, field: Field) -> Result<Option<u64>, BuildError> {
    let invalid = BuildError::InvalidField {
        field: field.name,
        expected: "an unsigned integer",
    };

    match field.lookup(record) {
        None => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or(invalid),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid),
        Some(_) => Err(invalid),
    }
}

/// Same as [`get_u64`], restricted to values that fit in 32 bits
pub fn get_u32(record: &RawRecord, field: Field) -> Result<Option<u32>, BuildError> {
    match get_u64(record, field)? {
        None => Ok(None),
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| BuildError::InvalidField {
                field: field.name,
                expected: "an unsigned 32-bit integer",
            }),
    }
}

/// Signed integer value of `field`, if present.
///
/// Accepts a JSON integer, a whole float or decimal text with an optional
/// sign. Digit strings wider than `i128` saturate, so out-of-range tags keep
/// their sign instead of turning into a type error.
pub fn get_integer(record: &RawRecord, field: Field) -> Result<Option<i128>, BuildError> {
    let invalid = BuildError::InvalidField {
        field: field.name,
        expected: "an integer",
    };

    match field.lookup(record) {
        None => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                Ok(Some(i128::from(v)))
            } else if let Some(v) = n.as_u64() {
                Ok(Some(i128::from(v)))
            } else {
                match n.as_f64() {
                    Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i128)),
                    _ => Err(invalid),
                }
            }
        }
        Some(Value::String(s)) => parse_integer(s.trim()).map(Some).ok_or(invalid),
        Some(_) => Err(invalid),
    }
}

fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    match text.parse::<i128>() {
        Ok(value) => Some(value),
        Err(_) if negative => Some(i128::MIN),
        Err(_) => Some(i128::MAX),
    }
}

/// Array value of `field`, if present
pub fn get_array(record: &RawRecord, field: Field) -> Result<Option<&Vec<Value>>, BuildError> {
    match field.lookup(record) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(BuildError::InvalidField {
            field: field.name,
            expected: "an array",
        }),
    }
}
