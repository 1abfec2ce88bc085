//! Core building blocks for single-operation remote procedure invocation.
//!
//! This crate is runtime-agnostic apart from the optional `tokio_support`
//! feature, which adds [`frame::FramedStream`] for reading and writing frames
//! on a live connection. Hosting and calling live in the `extensions/` crates.

pub mod codec;
pub mod constants;
pub mod frame;
pub mod rpc;
