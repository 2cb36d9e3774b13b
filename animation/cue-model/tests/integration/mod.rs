//! Feature integration tests

mod controller;
mod loader;
mod locomotion;
