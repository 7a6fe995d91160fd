use std::collections::BTreeMap;

use rsb_types::RawValue;
use tracing::trace;

use crate::config::DecoderConfig;
use crate::error::{FormatError, FormatResult};

const OPEN: u8 = b'[';
const CLOSE: u8 = b']';
const META: u8 = b'^';
const TAG: u8 = b'T';
const KEY: u8 = b'K';
const VALUE: u8 = b'V';

/// Field whose scalar value names the enclosing container's type.
pub const TYPE_NAME_FIELD: &str = "_n";

/// Decode one object with the default limits.
pub fn decode(data: &[u8]) -> FormatResult<RawValue> {
    decode_with(data, &DecoderConfig::default())
}

/// Decode one object.
///
/// The buffer must hold exactly one top-level container, optionally
/// surrounded by whitespace. No partial tree is returned on error.
pub fn decode_with(data: &[u8], config: &DecoderConfig) -> FormatResult<RawValue> {
    let mut parser = Parser {
        data,
        pos: 0,
        max_depth: config.max_depth,
    };

    parser.skip_whitespace();
    match parser.peek() {
        None => return Err(FormatError::UnexpectedEnd { offset: parser.pos }),
        Some(OPEN) => {}
        Some(byte) => {
            return Err(FormatError::UnexpectedByte {
                offset: parser.pos,
                byte,
            })
        }
    }

    let value = parser.parse_container(1)?;
    parser.skip_whitespace();
    if parser.pos < data.len() {
        return Err(FormatError::TrailingBytes { offset: parser.pos });
    }

    trace!(bytes = data.len(), type_name = ?value.type_name(), "decoded raw value");
    Ok(value)
}

/// A parsed container whose shape is not yet checked.
struct Container {
    open: usize,
    type_name: Option<String>,
    /// Scalar value of the container's `_n` field.
    name_field: Option<String>,
    fields: BTreeMap<String, RawValue>,
    elements: Vec<RawValue>,
    scalar: Option<String>,
}

impl Container {
    fn into_value(self) -> FormatResult<RawValue> {
        RawValue::from_parts(self.type_name, self.fields, self.elements, self.scalar).map_err(|e| {
            FormatError::IllegalShape {
                offset: self.open,
                reason: e.to_string(),
            }
        })
    }
}

struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\n' | b'\r' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    /// Parse and validate a container starting at the current `[`.
    fn parse_container(&mut self, depth: usize) -> FormatResult<RawValue> {
        self.parse_parts(depth)?.into_value()
    }

    fn parse_parts(&mut self, depth: usize) -> FormatResult<Container> {
        let open = self.pos;
        if depth > self.max_depth {
            return Err(FormatError::TooDeep {
                offset: open,
                limit: self.max_depth,
            });
        }
        self.pos += 1;

        self.skip_whitespace();
        let meta_name = if self.peek() == Some(META) {
            self.pos += 1;
            self.skip_whitespace();
            self.expect(OPEN)?;
            // Only the metadata's own `_n` field names the outer container.
            let meta = self.parse_parts(depth + 1)?;
            let name = meta.name_field.clone();
            meta.into_value()?;
            name
        } else {
            None
        };

        self.skip_whitespace();
        let tag = if self.peek() == Some(TAG) {
            Some(self.read_token()?)
        } else {
            None
        };

        let mut fields = BTreeMap::new();
        let mut elements = Vec::new();
        let mut scalar: Option<String> = None;
        let mut field_name: Option<String> = None;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(FormatError::Unterminated { offset: open }),
                Some(CLOSE) => {
                    self.pos += 1;
                    break;
                }
                Some(KEY) => {
                    let key = self.read_token()?;
                    self.skip_whitespace();
                    let value = match self.peek() {
                        None => return Err(FormatError::Unterminated { offset: open }),
                        Some(OPEN) => self.parse_container(depth + 1)?,
                        Some(VALUE) => RawValue::scalar(self.read_token()?),
                        Some(byte) => {
                            return Err(FormatError::UnexpectedByte {
                                offset: self.pos,
                                byte,
                            })
                        }
                    };
                    if key == TYPE_NAME_FIELD {
                        if let Some(name) = value.scalar_value() {
                            field_name = Some(name.to_owned());
                            continue;
                        }
                    }
                    fields.insert(key, value);
                }
                Some(OPEN) => elements.push(self.parse_container(depth + 1)?),
                Some(VALUE) => {
                    let at = self.pos;
                    let value = self.read_token()?;
                    if scalar.replace(value).is_some() {
                        return Err(FormatError::IllegalShape {
                            offset: at,
                            reason: "second scalar in one container".into(),
                        });
                    }
                }
                Some(byte) => {
                    return Err(FormatError::UnexpectedByte {
                        offset: self.pos,
                        byte,
                    })
                }
            }
        }

        Ok(Container {
            open,
            type_name: meta_name.or_else(|| field_name.clone()).or(tag),
            name_field: field_name,
            fields,
            elements,
            scalar,
        })
    }

    fn expect(&self, want: u8) -> FormatResult<()> {
        match self.peek() {
            Some(byte) if byte == want => Ok(()),
            Some(byte) => Err(FormatError::UnexpectedByte {
                offset: self.pos,
                byte,
            }),
            None => Err(FormatError::UnexpectedEnd { offset: self.pos }),
        }
    }

    /// Read a `<letter><len>:<bytes>` token and return its payload.
    fn read_token(&mut self) -> FormatResult<String> {
        self.pos += 1;

        let digits_start = self.pos;
        let mut length: usize = 0;
        while let Some(byte @ b'0'..=b'9') = self.peek() {
            length = length
                .checked_mul(10)
                .and_then(|l| l.checked_add(usize::from(byte - b'0')))
                .ok_or(FormatError::LengthOverflow {
                    offset: digits_start,
                    length: usize::MAX,
                    remaining: self.data.len() - digits_start,
                })?;
            self.pos += 1;
        }
        if self.pos == digits_start {
            return Err(FormatError::ExpectedDigit { offset: self.pos });
        }

        match self.peek() {
            Some(b':') => self.pos += 1,
            Some(byte) => {
                return Err(FormatError::UnexpectedByte {
                    offset: self.pos,
                    byte,
                })
            }
            None => return Err(FormatError::UnexpectedEnd { offset: self.pos }),
        }

        let start = self.pos;
        let remaining = self.data.len() - start;
        if length > remaining {
            return Err(FormatError::LengthOverflow {
                offset: start,
                length,
                remaining,
            });
        }
        self.pos += length;

        String::from_utf8(self.data[start..self.pos].to_vec())
            .map_err(|_| FormatError::InvalidUtf8 { offset: start })
    }
}
