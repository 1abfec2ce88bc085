mod endpoint;
pub use endpoint::*;

pub mod error;
