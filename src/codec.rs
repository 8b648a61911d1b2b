//! Scalar codecs: non-primitive values that travel as JSON strings.
pub mod ip;
pub mod timestamp;

pub use timestamp::Timestamp;
