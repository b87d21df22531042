use log::debug;
use serde_json::{json, Map, Value};

use crate::{
    signature,
    value::{BusValue, MessageBuilder},
    Error, Result,
};

/// Encodes `json` into sequential bus values described by `sig`.
///
/// A signature with several top-level codes expects a JSON array with one
/// element per code. A single code consumes the value as is.
pub fn encode(builder: &mut MessageBuilder, sig: &str, json: &Value) -> Result<()> {
    debug!("Converting {json} to type: {sig}");

    let codes = signature::split(sig)?;

    if codes.len() == 1 {
        return encode_one(builder, &codes[0], json);
    }

    let items = json.as_array().ok_or_else(|| {
        Error::TypeMismatch(format!(
            "signature \"{sig}\" takes {} values, got {json}",
            codes.len()
        ))
    })?;

    if items.len() != codes.len() {
        return Err(Error::TypeMismatch(format!(
            "signature \"{sig}\" takes {} values, got {}",
            codes.len(),
            items.len()
        )));
    }

    for (code, item) in codes.iter().zip(items) {
        encode_one(builder, code, item)?;
    }

    Ok(())
}

fn encode_one(builder: &mut MessageBuilder, code: &str, json: &Value) -> Result<()> {
    match code.as_bytes().first() {
        Some(b's') => builder.append_str(expect_str(code, json)?),
        Some(b'o') => builder.append_object_path(expect_str(code, json)?),
        Some(b'g') => builder.append_signature(expect_str(code, json)?),
        Some(b'y') => builder.append(BusValue::U8(narrow(code, expect_unsigned(code, json)?)?)),
        Some(b'q') => builder.append(BusValue::U16(narrow(code, expect_unsigned(code, json)?)?)),
        Some(b'u') => builder.append(BusValue::U32(narrow(code, expect_unsigned(code, json)?)?)),
        Some(b't') => builder.append(BusValue::U64(expect_unsigned(code, json)?)),
        Some(b'n') => builder.append(BusValue::I16(narrow_signed(
            code,
            expect_signed(code, json)?,
        )?)),
        Some(b'i') => builder.append(BusValue::I32(narrow_signed(
            code,
            expect_signed(code, json)?,
        )?)),
        Some(b'x') => builder.append(BusValue::I64(expect_signed(code, json)?)),
        Some(b'd') => builder.append(BusValue::F64(expect_double(code, json)?)),
        Some(b'b') => {
            // Booleans arrive in many shapes. Accept them all
            let value = match json {
                Value::Bool(value) => *value,
                Value::Number(number) => {
                    if let Some(value) = number.as_i64() {
                        value > 0
                    } else if number.as_u64().is_some() {
                        true
                    } else {
                        return Err(mismatch(code, json));
                    }
                }
                Value::String(text) => text.starts_with('t') || text.starts_with('T'),
                _ => return Err(mismatch(code, json)),
            };

            builder.append(BusValue::Bool(value))
        }
        Some(b'a') => {
            let element = &code[1..];
            builder.open_array(element)?;

            if element.starts_with('{') {
                // Dict-entry arrays take the whole JSON object
                encode_one(builder, element, json)?;
            } else {
                let items = json.as_array().ok_or_else(|| mismatch(code, json))?;
                for item in items {
                    encode_one(builder, element, item)?;
                }
            }

            builder.close()
        }
        Some(b'(') => {
            let codes = signature::split(&code[1..code.len() - 1])?;
            let items = json.as_array().ok_or_else(|| mismatch(code, json))?;

            if items.len() != codes.len() {
                return Err(Error::TypeMismatch(format!(
                    "struct \"{code}\" takes {} values, got {}",
                    codes.len(),
                    items.len()
                )));
            }

            builder.open_struct();
            for (inner, item) in codes.iter().zip(items) {
                encode_one(builder, inner, item)?;
            }

            builder.close()
        }
        Some(b'{') => {
            let object = json.as_object().ok_or_else(|| mismatch(code, json))?;
            let inner = signature::split(&code[1..code.len() - 1])?;

            if inner.len() != 2 {
                return Err(Error::InvalidSignature(format!(
                    "dict entry \"{code}\" takes a key and a value"
                )));
            }

            for (key, value) in object {
                builder.open_dict_entry();
                encode_one(builder, &inner[0], &Value::String(key.clone()))?;
                encode_one(builder, &inner[1], value)?;
                builder.close()?;
            }

            Ok(())
        }
        Some(b'v') => {
            let inner = infer_signature(json)?;
            debug!("Appending variant of type: {inner}");

            builder.open_variant(&inner)?;
            encode_one(builder, &inner, json)?;
            builder.close()
        }
        _ => Err(Error::InvalidSignature(format!(
            "unknown type code \"{code}\""
        ))),
    }
}

/// Inner signature of a bare variant, inferred from the JSON shape.
fn infer_signature(json: &Value) -> Result<String> {
    let sig = match json {
        Value::Bool(_) => "b",
        Value::Number(number) if number.is_u64() => "t",
        Value::Number(number) if number.is_i64() => "x",
        Value::Number(_) => "d",
        Value::String(_) => "s",
        Value::Array(_) => "av",
        Value::Object(_) => "a{sv}",
        Value::Null => {
            return Err(Error::TypeMismatch("null carries no variant type".into()));
        }
    };

    Ok(sig.to_owned())
}

/// Decodes a bus value into schemaless JSON.
///
/// Variants unwrap to their inner value, structs render as arrays, and
/// dict-entry arrays aggregate into objects. Booleans render as the
/// integers `1`/`0` to match the legacy REST convention.
pub fn decode(value: &BusValue) -> Value {
    match value {
        BusValue::U8(value) => json!(value),
        BusValue::Bool(value) => json!(u8::from(*value)),
        BusValue::I16(value) => json!(value),
        BusValue::U16(value) => json!(value),
        BusValue::I32(value) => json!(value),
        BusValue::U32(value) => json!(value),
        BusValue::I64(value) => json!(value),
        BusValue::U64(value) => json!(value),
        BusValue::F64(value) => serde_json::Number::from_f64(*value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        BusValue::Str(value) | BusValue::ObjectPath(value) | BusValue::Signature(value) => {
            Value::String(value.clone())
        }
        BusValue::Array { signature, items } if signature.starts_with('{') => {
            let mut object = Map::new();
            for item in items {
                if let BusValue::DictEntry(key, value) = item {
                    object.insert(key_string(key), decode(value));
                }
            }

            Value::Object(object)
        }
        BusValue::Array { items, .. } => Value::Array(items.iter().map(decode).collect()),
        BusValue::Struct(items) => Value::Array(items.iter().map(decode).collect()),
        BusValue::DictEntry(key, value) => json!([decode(key), decode(value)]),
        BusValue::Variant { value, .. } => decode(value),
    }
}

/// JSON object keys are strings whatever the dict key type was.
fn key_string(key: &BusValue) -> String {
    match decode(key) {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn mismatch(code: &str, json: &Value) -> Error {
    Error::TypeMismatch(format!("{json} cannot encode as \"{code}\""))
}

fn expect_str<'a>(code: &str, json: &'a Value) -> Result<&'a str> {
    json.as_str().ok_or_else(|| mismatch(code, json))
}

fn expect_unsigned(code: &str, json: &Value) -> Result<u64> {
    json.as_u64().ok_or_else(|| mismatch(code, json))
}

// Unsigned values that fit widen through `as_i64`
fn expect_signed(code: &str, json: &Value) -> Result<i64> {
    json.as_i64().ok_or_else(|| mismatch(code, json))
}

// Integers of either sign widen through `as_f64`
fn expect_double(code: &str, json: &Value) -> Result<f64> {
    json.as_f64().ok_or_else(|| mismatch(code, json))
}

fn narrow<T: TryFrom<u64>>(code: &str, value: u64) -> Result<T> {
    T::try_from(value).map_err(|_| Error::TypeMismatch(format!("{value} does not fit \"{code}\"")))
}

fn narrow_signed<T: TryFrom<i64>>(code: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| Error::TypeMismatch(format!("{value} does not fit \"{code}\"")))
}

