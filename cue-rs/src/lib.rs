//! cue-rs library
//!
//! Command definitions and output helpers behind the `cue-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
