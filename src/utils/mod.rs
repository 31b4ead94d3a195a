// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;

pub use logging::{format_success, init_logger};
