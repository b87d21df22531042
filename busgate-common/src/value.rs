use crate::{signature, Error, Result};

/// A single typed value read from or written to the bus.
///
/// Arrays keep their element signature so that an empty dict-entry array
/// can still decode into a JSON object. Dict entries only occur as array
/// elements on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum BusValue {
    U8(u8),
    Bool(bool),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    ObjectPath(String),
    Signature(String),
    Array {
        signature: String,
        items: Vec<BusValue>,
    },
    Struct(Vec<BusValue>),
    DictEntry(Box<BusValue>, Box<BusValue>),
    Variant {
        signature: String,
        value: Box<BusValue>,
    },
}

impl BusValue {
    /// String payload of the three string-like types.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BusValue::Str(value) | BusValue::ObjectPath(value) | BusValue::Signature(value) => {
                Some(value)
            }
            _ => None,
        }
    }
}

enum Frame {
    Array {
        signature: String,
        items: Vec<BusValue>,
    },
    Struct(Vec<BusValue>),
    DictEntry(Vec<BusValue>),
    Variant {
        signature: String,
        items: Vec<BusValue>,
    },
}

/// Builds the argument list of an outgoing bus message.
///
/// Mirrors the open/append/close discipline of low-level bus message
/// APIs: containers are opened, filled, and closed in order, and
/// [MessageBuilder::finish] refuses to produce a message with a container
/// still open.
#[derive(Default)]
pub struct MessageBuilder {
    root: Vec<BusValue>,
    stack: Vec<Frame>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to the innermost open container, or to the message
    /// root if none is open.
    pub fn append(&mut self, value: BusValue) -> Result<()> {
        match self.stack.last_mut() {
            None => self.root.push(value),
            Some(Frame::Array { items, .. }) => items.push(value),
            Some(Frame::Struct(items)) => items.push(value),
            Some(Frame::DictEntry(items)) => {
                if items.len() == 2 {
                    return Err(Error::Encode(
                        "a dict entry holds exactly two values".into(),
                    ));
                }
                items.push(value);
            }
            Some(Frame::Variant { items, .. }) => {
                if !items.is_empty() {
                    return Err(Error::Encode("a variant holds exactly one value".into()));
                }
                items.push(value);
            }
        }

        Ok(())
    }

    pub fn append_str(&mut self, value: &str) -> Result<()> {
        self.append(BusValue::Str(value.to_owned()))
    }

    pub fn append_object_path(&mut self, path: &str) -> Result<()> {
        if !valid_object_path(path) {
            return Err(Error::Encode(format!("invalid object path \"{path}\"")));
        }

        self.append(BusValue::ObjectPath(path.to_owned()))
    }

    pub fn append_signature(&mut self, value: &str) -> Result<()> {
        signature::split(value).map_err(|e| Error::Encode(e.to_string()))?;

        self.append(BusValue::Signature(value.to_owned()))
    }

    pub fn open_array(&mut self, element_signature: &str) -> Result<()> {
        single_complete_type(element_signature)?;
        self.stack.push(Frame::Array {
            signature: element_signature.to_owned(),
            items: Vec::new(),
        });

        Ok(())
    }

    pub fn open_struct(&mut self) {
        self.stack.push(Frame::Struct(Vec::new()));
    }

    pub fn open_dict_entry(&mut self) {
        self.stack.push(Frame::DictEntry(Vec::new()));
    }

    pub fn open_variant(&mut self, inner_signature: &str) -> Result<()> {
        single_complete_type(inner_signature)?;
        self.stack.push(Frame::Variant {
            signature: inner_signature.to_owned(),
            items: Vec::new(),
        });

        Ok(())
    }

    /// Closes the innermost open container and appends it one level up.
    pub fn close(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::Encode("no open container to close".into()))?;

        let value = match frame {
            Frame::Array { signature, items } => BusValue::Array { signature, items },
            Frame::Struct(items) => BusValue::Struct(items),
            Frame::DictEntry(items) => {
                let [key, value]: [BusValue; 2] = items.try_into().map_err(|_| {
                    Error::Encode("a dict entry holds exactly two values".into())
                })?;

                BusValue::DictEntry(Box::new(key), Box::new(value))
            }
            Frame::Variant {
                signature,
                mut items,
            } => {
                let value = items
                    .pop()
                    .ok_or_else(|| Error::Encode("a variant holds exactly one value".into()))?;

                BusValue::Variant {
                    signature,
                    value: Box::new(value),
                }
            }
        };

        self.append(value)
    }

    pub fn finish(self) -> Result<Vec<BusValue>> {
        if !self.stack.is_empty() {
            return Err(Error::Encode("a container was left open".into()));
        }

        Ok(self.root)
    }
}

fn single_complete_type(value: &str) -> Result<()> {
    let codes = signature::split(value).map_err(|e| Error::Encode(e.to_string()))?;

    if codes.len() != 1 {
        return Err(Error::Encode(format!(
            "\"{value}\" is not a single complete type"
        )));
    }

    Ok(())
}

fn valid_object_path(path: &str) -> bool {
    if path == "/" {
        return true;
    }

    if !path.starts_with('/') || path.ends_with('/') {
        return false;
    }

    path[1..].split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

