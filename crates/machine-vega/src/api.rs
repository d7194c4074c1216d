//! Builtin-name registry for the Vega-8 API surface.
//!
//! The console's script engine resolves builtins by name. This module is the
//! static catalog of that surface: reserved keywords of the embedded Lua
//! dialect, the callable builtin names, and which layer of the console
//! implements each one. The console uses it to tell "cartridge calls an
//! unimplemented builtin" (diagnostic stub) apart from "cartridge calls a
//! name that was never part of the console" without hardcoding the check at
//! every call site.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Which layer of the console implements a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiLayer {
    /// Host scripting-language runtime (baselib).
    Baseline,
    /// Emulation support library (math, string and table helpers the host
    /// language exposes but the console reimplements).
    Lib,
    /// The virtual-machine core itself.
    Vm,
    /// The boot firmware.
    Bios,
}

/// Reserved words of the embedded Lua dialect. These can never be used as
/// identifiers, and are disjoint from the callable builtin set.
static KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

static FUNCTIONS: Lazy<HashMap<&'static str, ApiLayer>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let mut add = |names: &[&'static str], layer: ApiLayer| {
        for &name in names {
            // A few names appear in more than one layer of the firmware
            // listing; the first registration wins so every name has
            // exactly one entry.
            map.entry(name).or_insert(layer);
        }
    };

    // Host language baselib
    add(
        &[
            "assert",
            "getmetatable",
            "next",
            "pairs",
            "rawequal",
            "rawlen",
            "rawget",
            "rawset",
            "setmetatable",
            "type",
        ],
        ApiLayer::Baseline,
    );

    // Present in the host language but reimplemented by the console
    add(
        &[
            "load", "print", "max", "min", "mid", "ceil", "flr", "cos", "sin", "atan2", "sqrt",
            "abs", "sgn", "band", "bor", "bxor", "bnot", "shl", "shr", "lshr", "rotl", "rotr",
            "tostr", "tonum", "srand", "rnd", "ord", "chr",
        ],
        ApiLayer::Lib,
    );

    // Implemented in the virtual-machine core
    add(
        &[
            "run",
            "menuitem",
            "reload",
            "peek",
            "peek2",
            "peek4",
            "poke",
            "poke2",
            "poke4",
            "memcpy",
            "memset",
            "stat",
            "printh",
            "extcmd",
            "_update_buttons",
            "btn",
            "btnp",
            "cursor",
            "camera",
            "circ",
            "circfill",
            "clip",
            "cls",
            "color",
            "fillp",
            "fget",
            "fset",
            "line",
            "map",
            "mget",
            "mset",
            "pal",
            "palt",
            "pget",
            "pset",
            "rect",
            "rectfill",
            "sget",
            "sset",
            "spr",
            "sspr",
            "music",
            "sfx",
            "time",
        ],
        ApiLayer::Vm,
    );

    // Implemented in the boot firmware
    add(
        &[
            "cocreate", "coresume", "costatus", "yield", "trace", "stop", "count", "add", "sub",
            "foreach", "all", "del", "t", "dget", "dset", "cartdata", "save", "info", "abort",
            "folder", "resume", "reboot", "dir", "ls", "flip", "mapdraw",
        ],
        ApiLayer::Bios,
    );

    map
});

/// Native codes of the icon glyphs that double as identifiers.
const ICON_GLYPHS: std::ops::Range<u8> = 0x80..0x80 + 26;

/// Whether `name` is a reserved keyword.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Whether `name` is a known callable builtin.
///
/// Besides the catalog, any single icon glyph (native codes 0x80..0x9a) is
/// always known: cartridges use the button glyphs as identifiers.
pub fn is_api(name: &str) -> bool {
    if FUNCTIONS.contains_key(name) {
        return true;
    }
    console_charset::native(name).is_some_and(|b| ICON_GLYPHS.contains(&b))
}

/// Which layer implements the named builtin, if it is in the catalog.
pub fn layer(name: &str) -> Option<ApiLayer> {
    FUNCTIONS.get(name).copied()
}
