//! Library side of the `nimbus` binary: configuration, logging and command
//! execution on top of `nimbus_graph`.

pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod session;
