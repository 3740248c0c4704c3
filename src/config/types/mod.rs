//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Configuration error and diagnostic types     |

mod error;

pub use error::{ConfigDiagnostics, ConfigError};
