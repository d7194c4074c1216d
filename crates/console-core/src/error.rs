//! Error types for the console core.
//!
//! Only cartridge loading surfaces a hard error to the embedding front-end.
//! Everything else in the core absorbs bad input locally: out-of-range
//! memory accesses return sentinels, unknown builtins hit a diagnostic stub,
//! malformed text passes through the codec byte by byte.

use thiserror::Error;

/// A cartridge image could not be loaded.
///
/// Load failures are atomic: the console keeps whatever state it had before
/// the failed `load()`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cartridge image too small ({0} bytes)")]
    TooSmall(usize),

    #[error("invalid cartridge magic")]
    BadMagic,

    #[error("unsupported cartridge version {0}")]
    UnsupportedVersion(u32),

    #[error("cartridge truncated in {0} section")]
    Truncated(&'static str),

    #[error("{section} section larger than its memory region")]
    Oversize { section: &'static str },

    #[error("malformed cartridge: {0}")]
    Malformed(String),
}

/// A failure reported by the embedded script engine.
///
/// The engine is a black box; its diagnostics arrive as text. The core
/// never lets these escape `step()`: a failing cartridge halts gracefully.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script parse error: {0}")]
    Parse(String),

    #[error("script runtime error: {0}")]
    Runtime(String),
}
