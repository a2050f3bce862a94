//! Data types shared across the engine.

pub mod cluster;
pub mod config;
pub mod incident;
