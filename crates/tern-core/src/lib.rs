//! Core library for tern: configuration, logging, providers and exchange plumbing.

pub mod chunk;
pub mod config;
pub mod exchange;
pub mod logging;
pub mod providers;
