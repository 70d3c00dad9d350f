pub mod cli;
pub mod env;
pub mod telemetry;
pub mod upload;

pub use env::{Env, LogLevel, setup_tracing};
pub use upload::{Upload, UploadError};
