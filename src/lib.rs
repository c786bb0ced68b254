//! Library crate for mythos-herald, exposing modules for binaries and integration tests.

pub mod commands;
pub mod config;
pub mod dao;
pub mod error;
pub mod platform;
pub mod services;
pub mod state;
