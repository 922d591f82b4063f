//! Probing engines: echo probers, the hostname resolver chain, bulk sweeps
//! and continuous monitoring.

pub mod monitor;
pub mod network;
pub mod resolver;
pub mod scanner;
