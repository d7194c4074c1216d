//! Vega-8 cartridge image format.
//!
//! Layout:
//! - bytes 0-3: magic `VGA8`
//! - byte 4: format version
//! - bytes 5-8: code length, u32 little-endian
//! - code section (script source, stored in the native charset)
//! - sprite section (8 KiB)
//! - map section (4 KiB)
//! - flag section (256 bytes)
//!
//! Trailing bytes after the flag section are ignored, so carts can carry
//! extra tooling data without breaking older consoles.

use console_charset as charset;
use console_core::LoadError;

use crate::memory::{FLAG_COUNT, MAP_SIZE, SPRITE_SIZE};

pub(crate) const MAGIC: [u8; 4] = *b"VGA8";
pub(crate) const VERSION: u8 = 1;

const HEADER_LEN: usize = 9;

/// A parsed cartridge, staged before being committed to console memory.
pub struct Cartridge {
    /// Script source, decoded from the native charset to UTF-8.
    pub code: String,
    pub sprites: Vec<u8>,
    pub map: Vec<u8>,
    pub flags: Vec<u8>,
}

impl Cartridge {
    /// Parse a cartridge image.
    ///
    /// Parsing touches nothing but the input, so a failed parse cannot
    /// leave a console half-loaded.
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < HEADER_LEN {
            return Err(LoadError::TooSmall(data.len()));
        }
        if data[0..4] != MAGIC {
            return Err(LoadError::BadMagic);
        }
        if data[4] != VERSION {
            return Err(LoadError::UnsupportedVersion(u32::from(data[4])));
        }

        let code_len = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) as usize;
        let code_end = HEADER_LEN + code_len;
        if data.len() < code_end {
            return Err(LoadError::Truncated("code"));
        }
        let code = charset::decode(&data[HEADER_LEN..code_end]);

        let sprite_end = code_end + SPRITE_SIZE;
        if data.len() < sprite_end {
            return Err(LoadError::Truncated("sprite"));
        }
        let map_end = sprite_end + MAP_SIZE;
        if data.len() < map_end {
            return Err(LoadError::Truncated("map"));
        }
        let flag_end = map_end + FLAG_COUNT;
        if data.len() < flag_end {
            return Err(LoadError::Truncated("flag"));
        }

        Ok(Self {
            code,
            sprites: data[code_end..sprite_end].to_vec(),
            map: data[sprite_end..map_end].to_vec(),
            flags: data[map_end..flag_end].to_vec(),
        })
    }
}

/// Build a cartridge image from parts. The inverse of `parse`; used by
/// cartridge tooling and tests.
pub fn build(code: &str, sprites: &[u8], map: &[u8], flags: &[u8]) -> Vec<u8> {
    let native = charset::encode(code);
    let mut image = Vec::with_capacity(HEADER_LEN + native.len() + SPRITE_SIZE + MAP_SIZE + FLAG_COUNT);
    image.extend_from_slice(&MAGIC);
    image.push(VERSION);
    image.extend_from_slice(&(native.len() as u32).to_le_bytes());
    image.extend_from_slice(&native);

    let mut section = |data: &[u8], size: usize| {
        let len = data.len().min(size);
        image.extend_from_slice(&data[..len]);
        image.extend(std::iter::repeat_n(0u8, size - len));
    };
    section(sprites, SPRITE_SIZE);
    section(map, MAP_SIZE);
    section(flags, FLAG_COUNT);
    image
}
