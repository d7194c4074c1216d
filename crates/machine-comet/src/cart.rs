//! Comet cartridge format.
//!
//! A cartridge is a JSON document; binary sections are base64-encoded so
//! carts stay diffable and hand-editable:
//!
//! ```json
//! {
//!   "name": "orbit",
//!   "version": 1,
//!   "code": "function update() ... end",
//!   "gfx": "<base64>",
//!   "map": "<base64>",
//!   "flags": "<base64>",
//!   "palette": "<base64>"
//! }
//! ```
//!
//! Missing sections zero-fill their region; oversized sections are a load
//! error rather than silently clipping someone's artwork.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use console_core::LoadError;
use serde::{Deserialize, Serialize};

use crate::memory::{FLAG_COUNT, MAP_SIZE, PAL_SIZE, SPRITE_SIZE};

/// Newest cartridge format version this console understands.
pub(crate) const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CartFile {
    name: String,
    #[serde(default)]
    version: u32,
    code: String,
    #[serde(default)]
    gfx: Option<String>,
    #[serde(default)]
    map: Option<String>,
    #[serde(default)]
    flags: Option<String>,
    #[serde(default)]
    palette: Option<String>,
}

/// A parsed cartridge, staged before being committed to console memory.
pub struct Cartridge {
    pub name: String,
    pub version: u32,
    pub code: String,
    pub gfx: Vec<u8>,
    pub map: Vec<u8>,
    pub flags: Vec<u8>,
    pub palette: Vec<u8>,
}

fn section(encoded: Option<&String>, name: &'static str, max: usize) -> Result<Vec<u8>, LoadError> {
    let Some(encoded) = encoded else {
        return Ok(Vec::new());
    };
    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| LoadError::Malformed(format!("{name} section: {err}")))?;
    if bytes.len() > max {
        return Err(LoadError::Oversize { section: name });
    }
    Ok(bytes)
}

impl Cartridge {
    /// Parse a cartridge document. Touches nothing but the input.
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        let file: CartFile = serde_json::from_slice(data)
            .map_err(|err| LoadError::Malformed(err.to_string()))?;
        if file.version > VERSION {
            return Err(LoadError::UnsupportedVersion(file.version));
        }
        Ok(Self {
            gfx: section(file.gfx.as_ref(), "gfx", SPRITE_SIZE)?,
            map: section(file.map.as_ref(), "map", MAP_SIZE)?,
            flags: section(file.flags.as_ref(), "flags", FLAG_COUNT)?,
            palette: section(file.palette.as_ref(), "palette", PAL_SIZE)?,
            name: file.name,
            version: file.version,
            code: file.code,
        })
    }
}

/// Build a cartridge document from parts. The inverse of `parse`; used by
/// cartridge tooling and tests.
pub fn build(name: &str, code: &str, gfx: &[u8], map: &[u8], palette: &[u8]) -> Vec<u8> {
    let encode = |bytes: &[u8]| {
        if bytes.is_empty() {
            None
        } else {
            Some(BASE64.encode(bytes))
        }
    };
    let file = CartFile {
        name: name.to_string(),
        version: VERSION,
        code: code.to_string(),
        gfx: encode(gfx),
        map: encode(map),
        flags: None,
        palette: encode(palette),
    };
    serde_json::to_vec(&file).unwrap_or_default()
}
