// Public modules
pub mod build;
pub mod config;
pub mod credentials;
pub mod paths;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod publish;
pub mod release;
pub mod runtime;
pub mod toolchain;
pub mod trigger;
pub mod workspace;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
