use thiserror::Error;

/// A [`monorpc::codec::WireValue`] could not be converted into the Rust type
/// an operation expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireConvertError {
    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: String,
        found: &'static str,
    },

    #[error("expected {expected} values, found {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}
