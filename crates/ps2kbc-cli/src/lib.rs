#![forbid(unsafe_code)]

//! Port-access script replay for the i8042 controller model.

pub mod script;

pub use script::{parse_script, Replay, ReplaySummary, ScriptOp};
