use super::WireTag;
use std::fmt;

/// The semantic type of a value that can cross the wire.
///
/// Parameter and return types of an operation are described with this enum.
/// Its `Display` form is canonical and feeds the operation fingerprint, so
/// changing it changes every fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WireType {
    Unit,
    Bool,
    I32,
    I64,
    F32,
    F64,
    Str,
    Bytes,
    /// Homogeneous sequence of the boxed element type.
    List(Box<WireType>),
    /// Fixed-arity heterogeneous composite.
    Tuple(Vec<WireType>),
}

impl WireType {
    pub fn list_of(elem: WireType) -> Self {
        WireType::List(Box::new(elem))
    }

    /// How many list or tuple levels enclose the innermost scalar.
    /// Scalars are at depth `0`.
    pub fn nesting_depth(&self) -> usize {
        match self {
            WireType::List(elem) => 1 + elem.nesting_depth(),
            WireType::Tuple(elems) => {
                1 + elems.iter().map(WireType::nesting_depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn tag(&self) -> WireTag {
        match self {
            WireType::Unit => WireTag::Unit,
            WireType::Bool => WireTag::Bool,
            WireType::I32 => WireTag::I32,
            WireType::I64 => WireTag::I64,
            WireType::F32 => WireTag::F32,
            WireType::F64 => WireTag::F64,
            WireType::Str => WireTag::Str,
            WireType::Bytes => WireTag::Bytes,
            WireType::List(_) => WireTag::List,
            WireType::Tuple(_) => WireTag::Tuple,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::Unit => write!(f, "unit"),
            WireType::Bool => write!(f, "bool"),
            WireType::I32 => write!(f, "i32"),
            WireType::I64 => write!(f, "i64"),
            WireType::F32 => write!(f, "f32"),
            WireType::F64 => write!(f, "f64"),
            WireType::Str => write!(f, "str"),
            WireType::Bytes => write!(f, "bytes"),
            WireType::List(elem) => write!(f, "list<{elem}>"),
            WireType::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}
