//! Codec between the console's native 256-symbol charset and UTF-8.
//!
//! Native text is one byte per glyph. UTF-8 text is variable width, and a
//! handful of icon glyphs are multi-codepoint compounds (a base codepoint
//! plus variation selector-16), so encoding back to native bytes has to try
//! the longest matching glyph sequence first; matching the bare base
//! codepoint would silently corrupt the compound glyphs.
//!
//! The lookup tables are built once, on first use, and are read-only
//! afterwards; they are safe to share across threads.

use std::collections::HashMap;

use once_cell::sync::Lazy;

mod glyphs;

use glyphs::GLYPHS;

/// Derived lookup tables, built in one pass over the glyph map.
struct Charset {
    /// Exact encoded form of each multi-byte glyph, keyed by its bytes.
    from_text: HashMap<&'static [u8], u8>,
    /// Whether a byte can begin a multi-byte glyph encoding.
    multibyte_start: [bool; 256],
    /// Multi-byte glyph candidates per lead byte, longest first.
    candidates: Vec<Vec<(&'static [u8], u8)>>,
}

static TABLES: Lazy<Charset> = Lazy::new(Charset::build);

impl Charset {
    fn build() -> Self {
        let mut from_text = HashMap::new();
        let mut multibyte_start = [false; 256];
        let mut candidates: Vec<Vec<(&'static [u8], u8)>> = vec![Vec::new(); 256];

        for (native, glyph) in GLYPHS.iter().enumerate() {
            let bytes = glyph.as_bytes();
            if bytes.len() > 1 {
                from_text.insert(bytes, native as u8);
                multibyte_start[bytes[0] as usize] = true;
                candidates[bytes[0] as usize].push((bytes, native as u8));
            }
        }

        // Longest candidate first, so compound glyphs win over glyphs whose
        // encoding is a prefix of theirs.
        for list in &mut candidates {
            list.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        }

        Self {
            from_text,
            multibyte_start,
            candidates,
        }
    }

    fn longest_match(&self, input: &[u8]) -> Option<(usize, u8)> {
        self.candidates[input[0] as usize]
            .iter()
            .find(|(bytes, _)| input.starts_with(bytes))
            .map(|&(bytes, native)| (bytes.len(), native))
    }
}

/// The UTF-8 form of one native glyph.
pub fn glyph(native: u8) -> &'static str {
    GLYPHS[native as usize]
}

/// The native byte for an exactly-encoded glyph, if the text is one.
///
/// Single-byte glyphs encode as themselves, so `native("a")` is `Some(97)`.
pub fn native(text: &str) -> Option<u8> {
    match text.len() {
        0 => None,
        1 => Some(text.as_bytes()[0]),
        _ => TABLES.from_text.get(text.as_bytes()).copied(),
    }
}

/// Decode native-charset bytes to UTF-8 text.
///
/// Total over all byte values; never fails.
pub fn decode(native: &[u8]) -> String {
    let mut out = String::with_capacity(native.len());
    for &b in native {
        out.push_str(GLYPHS[b as usize]);
    }
    out
}

/// Encode UTF-8 text to native-charset bytes.
///
/// Bytes that cannot begin a multi-byte glyph copy through unchanged (the
/// common all-ASCII case never touches the match tables). Flagged bytes try
/// the longest glyph encoding starting there; on a match the glyph's native
/// byte is emitted, otherwise the byte falls through unchanged. Malformed
/// UTF-8 sequences are therefore passed along byte by byte, never rejected.
pub fn encode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let tables = &*TABLES;
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if tables.multibyte_start[b as usize] {
            if let Some((len, native)) = tables.longest_match(&bytes[pos..]) {
                out.push(native);
                pos += len;
                continue;
            }
        }
        out.push(b);
        pos += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_native_bytes() {
        for b in 0..=255u8 {
            let text = decode(&[b]);
            assert_eq!(encode(&text), vec![b], "glyph {b:#04x} ({text:?})");
        }
    }

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(decode(&[]), "");
        assert_eq!(encode(""), Vec::<u8>::new());
    }

    #[test]
    fn test_ascii_fast_path_is_identity() {
        let text = "function _update() x += 1 end";
        assert_eq!(encode(text), text.as_bytes());
    }

    #[test]
    fn test_compound_glyph_wins_longest_match() {
        // Down arrow + variation selector-16 is one glyph...
        assert_eq!(encode("\u{2b07}\u{fe0f}"), vec![0x83]);
        // ...while the bare down arrow matches nothing and falls through
        // byte by byte.
        let bare = encode("\u{2b07}");
        assert_eq!(bare, "\u{2b07}".as_bytes());
        assert_ne!(bare, vec![0x83]);
    }

    #[test]
    fn test_all_compound_button_glyphs() {
        for (text, native) in [
            ("\u{2b07}\u{fe0f}", 0x83), // down
            ("\u{2b05}\u{fe0f}", 0x8b), // left
            ("\u{1f17e}\u{fe0f}", 0x8e), // circled-o button
            ("\u{27a1}\u{fe0f}", 0x91), // right
            ("\u{2b06}\u{fe0f}", 0x94), // up
        ] {
            assert_eq!(encode(text), vec![native]);
            assert_eq!(decode(&[native]), text);
        }
    }

    #[test]
    fn test_unmatched_multibyte_passes_through() {
        // U+00C0 starts with 0xC3, which is not a glyph lead byte; U+2630
        // starts with 0xE2, which is. Both must pass through unchanged.
        for text in ["\u{c0}", "\u{2630}"] {
            assert_eq!(encode(text), text.as_bytes(), "{text:?}");
        }
    }

    #[test]
    fn test_mixed_text() {
        let text = format!("go {}!", "\u{2b06}\u{fe0f}");
        assert_eq!(encode(&text), vec![b'g', b'o', b' ', 0x94, b'!']);
        assert_eq!(decode(&encode(&text)), text);
    }

    #[test]
    fn test_exact_glyph_lookup() {
        assert_eq!(native("a"), Some(97));
        assert_eq!(native("\u{2588}"), Some(0x80)); // full block
        assert_eq!(native("no"), None);
        assert_eq!(native(""), None);
        assert_eq!(glyph(0x7f), "\u{25cb}");
    }
}
