use super::{WireDecodeError, WireTag, WireType, WireValue};
use crate::constants::MAX_WIRE_NESTING_DEPTH;
use bytes::{Buf, BufMut, BytesMut};

/// Encodes ordered value sequences to bytes and decodes them back against a
/// statically known list of expected types.
///
/// ### Layout
///
/// All integers are little-endian.
///
/// ```text
/// sequence := count:u32 value*
/// value    := tag:u8 body
/// body     := ()                      Unit
///           | 0x00 | 0x01             Bool
///           | i32 | i64               I32 | I64
///           | f32 bits | f64 bits     F32 | F64
///           | len:u32 utf8[len]       Str
///           | len:u32 u8[len]         Bytes
///           | count:u32 value*        List | Tuple
/// ```
///
/// Encoding the same values twice always yields identical bytes. Length
/// fields are 32 bits wide; payloads are bounded far below that by the frame
/// size limit.
pub struct WireCodec;

impl WireCodec {
    /// Encodes `values` as a standalone sequence.
    pub fn encode(values: &[WireValue]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        Self::encode_into(&mut buf, values);
        buf.to_vec()
    }

    /// Appends the encoded sequence to an existing buffer, e.g. after a
    /// message header.
    pub fn encode_into(buf: &mut BytesMut, values: &[WireValue]) {
        buf.put_u32_le(values.len() as u32);
        for value in values {
            Self::encode_value(buf, value);
        }
    }

    fn encode_value(buf: &mut BytesMut, value: &WireValue) {
        buf.put_u8(value.tag().into());

        match value {
            WireValue::Unit => {}
            WireValue::Bool(b) => buf.put_u8(u8::from(*b)),
            WireValue::I32(n) => buf.put_i32_le(*n),
            WireValue::I64(n) => buf.put_i64_le(*n),
            WireValue::F32(x) => buf.put_u32_le(x.to_bits()),
            WireValue::F64(x) => buf.put_u64_le(x.to_bits()),
            WireValue::Str(s) => {
                buf.put_u32_le(s.len() as u32);
                buf.put_slice(s.as_bytes());
            }
            WireValue::Bytes(bytes) => {
                buf.put_u32_le(bytes.len() as u32);
                buf.put_slice(bytes);
            }
            WireValue::List(items) | WireValue::Tuple(items) => {
                buf.put_u32_le(items.len() as u32);
                for item in items {
                    Self::encode_value(buf, item);
                }
            }
        }
    }

    /// Decodes a complete sequence, requiring it to contain exactly one value
    /// per entry of `expected`, each conforming to its type, and nothing else.
    pub fn decode(bytes: &[u8], expected: &[WireType]) -> Result<Vec<WireValue>, WireDecodeError> {
        let mut reader = WireReader::new(bytes);

        let count = reader.read_u32()? as usize;
        if count != expected.len() {
            return Err(WireDecodeError::CountMismatch {
                expected: expected.len(),
                actual: count,
            });
        }

        let mut values = Vec::with_capacity(count);
        for (index, ty) in expected.iter().enumerate() {
            values.push(reader.read_value(ty, index, 0)?);
        }

        if reader.remaining() > 0 {
            return Err(WireDecodeError::TrailingBytes {
                remaining: reader.remaining(),
            });
        }

        Ok(values)
    }
}

/// Cursor over an input slice that tracks its absolute offset for error
/// reporting.
struct WireReader<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireDecodeError> {
        if self.remaining() < len {
            return Err(WireDecodeError::Truncated {
                offset: self.offset,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.input[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, WireDecodeError> {
        Ok(self.take(1)?.get_u8())
    }

    fn read_u32(&mut self) -> Result<u32, WireDecodeError> {
        Ok(self.take(4)?.get_u32_le())
    }

    /// Reads a `u32` element count and rejects counts that could not possibly
    /// fit in the remaining input (every element occupies at least its tag).
    fn read_count(&mut self) -> Result<usize, WireDecodeError> {
        let offset = self.offset;
        let count = self.read_u32()? as usize;
        if count > self.remaining() {
            return Err(WireDecodeError::Truncated {
                offset,
                needed: count - self.remaining(),
            });
        }
        Ok(count)
    }

    fn read_len_prefixed(&mut self) -> Result<&'a [u8], WireDecodeError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_value(
        &mut self,
        expected: &WireType,
        index: usize,
        depth: usize,
    ) -> Result<WireValue, WireDecodeError> {
        // Same bound `OperationDescriptor::new` enforces on declared types.
        if depth > MAX_WIRE_NESTING_DEPTH {
            return Err(WireDecodeError::NestingTooDeep {
                max: MAX_WIRE_NESTING_DEPTH,
            });
        }

        let tag_offset = self.offset;
        let raw_tag = self.read_u8()?;
        let tag = WireTag::try_from(raw_tag).map_err(|_| WireDecodeError::InvalidTag {
            offset: tag_offset,
            tag: raw_tag,
        })?;

        if tag != expected.tag() {
            return Err(WireDecodeError::TypeMismatch {
                index,
                expected: expected.to_string(),
                found: format!("{tag:?}").to_lowercase(),
            });
        }

        let value = match expected {
            WireType::Unit => WireValue::Unit,
            WireType::Bool => {
                let offset = self.offset;
                match self.read_u8()? {
                    0 => WireValue::Bool(false),
                    1 => WireValue::Bool(true),
                    byte => return Err(WireDecodeError::InvalidBool { offset, byte }),
                }
            }
            WireType::I32 => WireValue::I32(self.take(4)?.get_i32_le()),
            WireType::I64 => WireValue::I64(self.take(8)?.get_i64_le()),
            WireType::F32 => WireValue::F32(f32::from_bits(self.take(4)?.get_u32_le())),
            WireType::F64 => WireValue::F64(f64::from_bits(self.take(8)?.get_u64_le())),
            WireType::Str => {
                let offset = self.offset;
                let raw = self.read_len_prefixed()?;
                let s = std::str::from_utf8(raw)
                    .map_err(|_| WireDecodeError::InvalidUtf8 { offset })?;
                WireValue::Str(s.to_owned())
            }
            WireType::Bytes => WireValue::Bytes(self.read_len_prefixed()?.to_vec()),
            WireType::List(elem) => {
                let count = self.read_count()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value(elem, index, depth + 1)?);
                }
                WireValue::List(items)
            }
            WireType::Tuple(elems) => {
                let count = self.read_count()?;
                if count != elems.len() {
                    return Err(WireDecodeError::TypeMismatch {
                        index,
                        expected: expected.to_string(),
                        found: format!("tuple of {count}"),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for elem in elems {
                    items.push(self.read_value(elem, index, depth + 1)?);
                }
                WireValue::Tuple(items)
            }
        };

        Ok(value)
    }
}
