//! Command implementations

pub mod model;
