//! Embedded Frame
//!
//! Address, isolation flags and load lifecycle of the embedded content reference.

pub mod host;
pub mod isolation;

pub use host::{FrameHost, FrameState, LifecycleState};
pub use isolation::{
    default_isolation_flags, parse_isolation_flags, sandbox_attribute, IsolationFlag,
};
