use crate::WireConvertError;
use bytes::Bytes;
use monorpc::codec::{WireType, WireValue};

/// A Rust type with a fixed [`WireType`] and lossless conversions to and from
/// [`WireValue`].
///
/// Byte strings map to [`bytes::Bytes`]; `Vec<T>` always maps to a list.
pub trait WireFormat: Sized {
    fn wire_type() -> WireType;

    fn into_wire(self) -> WireValue;

    fn from_wire(value: WireValue) -> Result<Self, WireConvertError>;
}

/// An ordered parameter list, expressed as a tuple of [`WireFormat`] types.
///
/// `()` is the empty list and `(T,)` a single parameter.
pub trait WireArgs: Sized {
    fn wire_types() -> Vec<WireType>;

    fn into_args(self) -> Vec<WireValue>;

    fn from_args(args: Vec<WireValue>) -> Result<Self, WireConvertError>;
}

fn mismatch<T: WireFormat>(found: &WireValue) -> WireConvertError {
    WireConvertError::TypeMismatch {
        expected: T::wire_type().to_string(),
        found: found.kind_name(),
    }
}

macro_rules! impl_wire_format_for_scalar {
    ($ty:ty, $variant:ident) => {
        impl WireFormat for $ty {
            fn wire_type() -> WireType {
                WireType::$variant
            }

            fn into_wire(self) -> WireValue {
                WireValue::$variant(self)
            }

            fn from_wire(value: WireValue) -> Result<Self, WireConvertError> {
                match value {
                    WireValue::$variant(inner) => Ok(inner),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    };
}

impl_wire_format_for_scalar!(bool, Bool);
impl_wire_format_for_scalar!(i32, I32);
impl_wire_format_for_scalar!(i64, I64);
impl_wire_format_for_scalar!(f32, F32);
impl_wire_format_for_scalar!(f64, F64);
impl_wire_format_for_scalar!(String, Str);

impl WireFormat for () {
    fn wire_type() -> WireType {
        WireType::Unit
    }

    fn into_wire(self) -> WireValue {
        WireValue::Unit
    }

    fn from_wire(value: WireValue) -> Result<Self, WireConvertError> {
        match value {
            WireValue::Unit => Ok(()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl WireFormat for Bytes {
    fn wire_type() -> WireType {
        WireType::Bytes
    }

    fn into_wire(self) -> WireValue {
        WireValue::Bytes(self.to_vec())
    }

    fn from_wire(value: WireValue) -> Result<Self, WireConvertError> {
        match value {
            WireValue::Bytes(inner) => Ok(Bytes::from(inner)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: WireFormat> WireFormat for Vec<T> {
    fn wire_type() -> WireType {
        WireType::list_of(T::wire_type())
    }

    fn into_wire(self) -> WireValue {
        WireValue::List(self.into_iter().map(WireFormat::into_wire).collect())
    }

    fn from_wire(value: WireValue) -> Result<Self, WireConvertError> {
        match value {
            WireValue::List(items) => items.into_iter().map(T::from_wire).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl WireArgs for () {
    fn wire_types() -> Vec<WireType> {
        Vec::new()
    }

    fn into_args(self) -> Vec<WireValue> {
        Vec::new()
    }

    fn from_args(args: Vec<WireValue>) -> Result<Self, WireConvertError> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(WireConvertError::ArityMismatch {
                expected: 0,
                actual: args.len(),
            })
        }
    }
}

fn split_exact<const N: usize>(values: Vec<WireValue>) -> Result<[WireValue; N], WireConvertError> {
    values
        .try_into()
        .map_err(|values: Vec<WireValue>| WireConvertError::ArityMismatch {
            expected: N,
            actual: values.len(),
        })
}

// Tuples are both composite values and parameter lists.
macro_rules! impl_wire_tuple {
    ($len:literal; $($ty:ident $var:ident),+) => {
        impl<$($ty: WireFormat),+> WireFormat for ($($ty,)+) {
            fn wire_type() -> WireType {
                WireType::Tuple(vec![$($ty::wire_type()),+])
            }

            fn into_wire(self) -> WireValue {
                let ($($var,)+) = self;
                WireValue::Tuple(vec![$($var.into_wire()),+])
            }

            fn from_wire(value: WireValue) -> Result<Self, WireConvertError> {
                match value {
                    WireValue::Tuple(members) => {
                        let [$($var),+] = split_exact::<$len>(members)?;
                        Ok(($($ty::from_wire($var)?,)+))
                    }
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }

        impl<$($ty: WireFormat),+> WireArgs for ($($ty,)+) {
            fn wire_types() -> Vec<WireType> {
                vec![$($ty::wire_type()),+]
            }

            fn into_args(self) -> Vec<WireValue> {
                let ($($var,)+) = self;
                vec![$($var.into_wire()),+]
            }

            fn from_args(args: Vec<WireValue>) -> Result<Self, WireConvertError> {
                let [$($var),+] = split_exact::<$len>(args)?;
                Ok(($($ty::from_wire($var)?,)+))
            }
        }
    };
}

impl_wire_tuple!(1; A a);
impl_wire_tuple!(2; A a, B b);
impl_wire_tuple!(3; A a, B b, C c);
impl_wire_tuple!(4; A a, B b, C c, D d);
