//! Shared utilities for the Custos workspace.

pub mod logging;

pub use logging::{init_logging, try_init_logging, LogFormat};
