//! Core values, errors, and constants for querylib.
//!
//! This crate provides the foundational types shared by the parser, the
//! library model, the connection adapter, and the binding runtime.
//!
//! ## Core Types
//!
//! - [`Value`] — A single column value crossing the connection boundary
//! - [`Row`] — An ordered tuple of values with its column names
//! - [`FormatError`], [`DefinitionError`], [`ResolutionError`],
//!   [`InvocationError`] — The error taxonomy
//! - [`Error`] — Umbrella error for application-level entry points
mod error;
mod row;
mod value;

pub use error::*;
pub use row::*;
pub use value::*;

// ============================================================================
// STREAMING
// ============================================================================
/// Rows per batch produced by `chunks` symbols.
pub const CHUNK_SIZE: usize = 256;

// ============================================================================
// LIBRARY FILES
// Files are named lib{NAME}.sql and found along QLIB_LIBPATH.
// ============================================================================
/// File name prefix of an ILF library.
pub const LIBRARY_PREFIX: &str = "lib";
/// File name suffix of an ILF library.
pub const LIBRARY_SUFFIX: &str = ".sql";

// ============================================================================
// ENVIRONMENT
// ============================================================================
/// Environment variable holding the PostgreSQL connection string.
pub const ENV_DB_URL: &str = "DB_URL";
/// Environment variable holding the library search path.
pub const ENV_LIBPATH: &str = "QLIB_LIBPATH";

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize terminal logging at INFO.
/// Repeated calls are ignored, so tests and binaries may both call it.
#[cfg(feature = "server")]
pub fn log() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    if simplelog::CombinedLogger::init(vec![term]).is_err() {
        log::debug!("logger already initialized");
    }
}
