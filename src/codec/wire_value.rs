use super::{WireTag, WireType};

/// A typed value carried as an argument or result.
///
/// Floats compare with IEEE semantics through the derived `PartialEq`, so a
/// `NaN` never equals itself even though it round-trips bit-for-bit.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Unit,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<WireValue>),
    Tuple(Vec<WireValue>),
}

impl WireValue {
    pub fn tag(&self) -> WireTag {
        match self {
            WireValue::Unit => WireTag::Unit,
            WireValue::Bool(_) => WireTag::Bool,
            WireValue::I32(_) => WireTag::I32,
            WireValue::I64(_) => WireTag::I64,
            WireValue::F32(_) => WireTag::F32,
            WireValue::F64(_) => WireTag::F64,
            WireValue::Str(_) => WireTag::Str,
            WireValue::Bytes(_) => WireTag::Bytes,
            WireValue::List(_) => WireTag::List,
            WireValue::Tuple(_) => WireTag::Tuple,
        }
    }

    /// Returns `true` when this value is a valid inhabitant of `ty`,
    /// recursing into list elements and tuple members.
    pub fn conforms_to(&self, ty: &WireType) -> bool {
        match (self, ty) {
            (WireValue::Unit, WireType::Unit)
            | (WireValue::Bool(_), WireType::Bool)
            | (WireValue::I32(_), WireType::I32)
            | (WireValue::I64(_), WireType::I64)
            | (WireValue::F32(_), WireType::F32)
            | (WireValue::F64(_), WireType::F64)
            | (WireValue::Str(_), WireType::Str)
            | (WireValue::Bytes(_), WireType::Bytes) => true,
            (WireValue::List(items), WireType::List(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            (WireValue::Tuple(items), WireType::Tuple(elems)) => {
                items.len() == elems.len()
                    && items.iter().zip(elems).all(|(item, elem)| item.conforms_to(elem))
            }
            _ => false,
        }
    }

    /// Short human-readable name of the value's variant, used in errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Unit => "unit",
            WireValue::Bool(_) => "bool",
            WireValue::I32(_) => "i32",
            WireValue::I64(_) => "i64",
            WireValue::F32(_) => "f32",
            WireValue::F64(_) => "f64",
            WireValue::Str(_) => "str",
            WireValue::Bytes(_) => "bytes",
            WireValue::List(_) => "list",
            WireValue::Tuple(_) => "tuple",
        }
    }
}
