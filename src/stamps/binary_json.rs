//! Reader for the legacy Qt binary JSON format (`qbjs`, version 1).
//!
//! Older editor versions wrote stamp files in this format. Documents are
//! decoded into [`serde_json::Value`] and then handled like text JSON.
//!
//! Layout, all integers little endian:
//! - header: tag `qbjs`, version `1`
//! - base (object or array): `size`, `is_object | length << 1`, `table_offset`
//! - arrays keep one 32-bit value per element in the table; objects keep
//!   offsets to entries, each a 32-bit value followed by its key
//! - a value packs `type` (3 bits), `latin_or_int`, `latin_key` and a 27-bit
//!   payload that is either an inline integer/bool or an offset from the
//!   enclosing base

use serde_json::{Map, Number, Value};
use thiserror::Error;

const TAG: &[u8; 4] = b"qbjs";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 8;
const BASE_SIZE: usize = 12;
const MAX_DEPTH: usize = 256;

const TYPE_NULL: u32 = 0;
const TYPE_BOOL: u32 = 1;
const TYPE_DOUBLE: u32 = 2;
const TYPE_STRING: u32 = 3;
const TYPE_ARRAY: u32 = 4;
const TYPE_OBJECT: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BinaryJsonError {
    #[error("missing binary JSON header")]
    NotBinary,
    #[error("unsupported binary JSON version {0}")]
    UnsupportedVersion(u32),
    #[error("binary JSON data truncated at offset {0}")]
    Truncated(usize),
    #[error("invalid value type {0}")]
    InvalidType(u32),
    #[error("binary JSON nested too deeply")]
    TooDeep,
}

/// True when `data` starts with the binary JSON tag.
pub fn is_binary_json(data: &[u8]) -> bool {
    data.starts_with(TAG)
}

/// Decodes a binary JSON document into its root object or array.
pub fn decode(data: &[u8]) -> Result<Value, BinaryJsonError> {
    if !is_binary_json(data) {
        return Err(BinaryJsonError::NotBinary);
    }
    if data.len() < HEADER_SIZE + BASE_SIZE {
        return Err(BinaryJsonError::Truncated(data.len()));
    }

    let reader = Reader { data };
    let version = reader.u32_at(4)?;
    if version != VERSION {
        return Err(BinaryJsonError::UnsupportedVersion(version));
    }

    reader.base(HEADER_SIZE, 0)
}

struct Reader<'a> {
    data: &'a [u8],
}

impl Reader<'_> {
    fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], BinaryJsonError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(BinaryJsonError::Truncated(offset))
    }

    fn u16_at(&self, offset: usize) -> Result<u16, BinaryJsonError> {
        let bytes = self.bytes(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32_at(&self, offset: usize) -> Result<u32, BinaryJsonError> {
        let bytes = self.bytes(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn f64_at(&self, offset: usize) -> Result<f64, BinaryJsonError> {
        let bytes = self.bytes(offset, 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    fn base(&self, pos: usize, depth: usize) -> Result<Value, BinaryJsonError> {
        if depth > MAX_DEPTH {
            return Err(BinaryJsonError::TooDeep);
        }

        let size = self.u32_at(pos)? as usize;
        self.bytes(pos, size)?;
        let header = self.u32_at(pos + 4)?;
        let is_object = header & 1 != 0;
        let length = (header >> 1) as usize;
        let table = pos + self.u32_at(pos + 8)? as usize;

        if is_object {
            let mut object = Map::new();
            for i in 0..length {
                let entry = pos + self.u32_at(table + 4 * i)? as usize;
                let raw = self.u32_at(entry)?;
                let key = if raw & (1 << 4) != 0 {
                    self.latin1_string(entry + 4)?
                } else {
                    self.utf16_string(entry + 4)?
                };
                object.insert(key, self.value(raw, pos, depth)?);
            }
            Ok(Value::Object(object))
        } else {
            let mut array = Vec::with_capacity(length.min(self.data.len() / 4));
            for i in 0..length {
                let raw = self.u32_at(table + 4 * i)?;
                array.push(self.value(raw, pos, depth)?);
            }
            Ok(Value::Array(array))
        }
    }

    fn value(&self, raw: u32, base: usize, depth: usize) -> Result<Value, BinaryJsonError> {
        let kind = raw & 0x7;
        let latin_or_int = raw & (1 << 3) != 0;
        let payload = (raw >> 5) as usize;

        match kind {
            TYPE_NULL => Ok(Value::Null),
            TYPE_BOOL => Ok(Value::Bool(payload != 0)),
            TYPE_DOUBLE if latin_or_int => Ok(Value::Number(Number::from((raw as i32) >> 5))),
            TYPE_DOUBLE => Ok(number_value(self.f64_at(base + payload)?)),
            TYPE_STRING if latin_or_int => Ok(Value::String(self.latin1_string(base + payload)?)),
            TYPE_STRING => Ok(Value::String(self.utf16_string(base + payload)?)),
            TYPE_ARRAY | TYPE_OBJECT => self.base(base + payload, depth + 1),
            other => Err(BinaryJsonError::InvalidType(other)),
        }
    }

    fn latin1_string(&self, offset: usize) -> Result<String, BinaryJsonError> {
        let len = self.u16_at(offset)? as usize;
        let bytes = self.bytes(offset + 2, len)?;
        Ok(bytes.iter().map(|&b| char::from(b)).collect())
    }

    fn utf16_string(&self, offset: usize) -> Result<String, BinaryJsonError> {
        let len = self.u32_at(offset)? as usize;
        let byte_len = len
            .checked_mul(2)
            .ok_or(BinaryJsonError::Truncated(offset))?;
        let bytes = self.bytes(offset + 4, byte_len)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }
}

/// Integral doubles become integers so they deserialize into integer fields.
fn number_value(value: f64) -> Value {
    const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
