//! Core translation engine module

pub mod backend;
pub mod cache;
pub(crate) mod cancel;
pub mod config;
pub mod errors;
pub mod language;
pub mod models;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
