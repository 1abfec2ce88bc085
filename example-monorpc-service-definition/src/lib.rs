//! Operations shared by the monorpc tests and benchmarks.

mod operations;
pub use operations::*;
