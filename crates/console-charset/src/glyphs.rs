/// The 256-glyph native character map, ordered by native code.
///
/// Entries are UTF-8 fragments rather than single `char`s because several
/// icon glyphs are multi-codepoint compounds, e.g. the down-arrow button is
/// U+2B07 followed by U+FE0F (variation selector-16).
pub(crate) const GLYPHS: [&str; 256] = [
    // 0x00: control codes and superscript digits
    "\0", "¹", "²", "³", "⁴", "⁵", "⁶", "⁷",
    "⁸", "\t", "\n", "ᵇ", "ᶜ", "\r", "ᵉ", "ᶠ",
    // 0x10: symbol glyphs and CJK punctuation
    "▮", "■", "□", "⁙", "⁘", "‖", "◀", "▶",
    "「", "」", "¥", "•", "、", "。", "゛", "゜",
    // 0x20..0x7e: plain ASCII, then the circle glyph at 0x7f
    " ", "!", "\"", "#", "$", "%", "&", "'",
    "(", ")", "*", "+", ",", "-", ".", "/",
    "0", "1", "2", "3", "4", "5", "6", "7",
    "8", "9", ":", ";", "<", "=", ">", "?",
    "@", "A", "B", "C", "D", "E", "F", "G",
    "H", "I", "J", "K", "L", "M", "N", "O",
    "P", "Q", "R", "S", "T", "U", "V", "W",
    "X", "Y", "Z", "[", "\\", "]", "^", "_",
    "`", "a", "b", "c", "d", "e", "f", "g",
    "h", "i", "j", "k", "l", "m", "n", "o",
    "p", "q", "r", "s", "t", "u", "v", "w",
    "x", "y", "z", "{", "|", "}", "~", "○",
    // 0x80: icon glyphs (five are emoji + variation selector-16 compounds)
    "█", "▒", "🐱", "⬇\u{fe0f}", "░", "✽", "●", "♥",
    "☉", "웃", "⌂", "⬅\u{fe0f}", "😐", "♪", "🅾\u{fe0f}", "◆",
    "…", "➡\u{fe0f}", "★", "⧗", "⬆\u{fe0f}", "ˇ", "∧", "❎",
    "▤", "▥",
    // 0x9a: hiragana
    "あ", "い", "う", "え", "お", "か", "き", "く",
    "け", "こ", "さ", "し", "す", "せ", "そ", "た",
    "ち", "つ", "て", "と", "な", "に", "ぬ", "ね",
    "の", "は", "ひ", "ふ", "へ", "ほ", "ま", "み",
    "む", "め", "も", "や", "ゆ", "よ", "ら", "り",
    "る", "れ", "ろ", "わ", "を", "ん", "っ", "ゃ",
    "ゅ", "ょ",
    // 0xcc: katakana
    "ア", "イ", "ウ", "エ", "オ", "カ", "キ", "ク",
    "ケ", "コ", "サ", "シ", "ス", "セ", "ソ", "タ",
    "チ", "ツ", "テ", "ト", "ナ", "ニ", "ヌ", "ネ",
    "ノ", "ハ", "ヒ", "フ", "ヘ", "ホ", "マ", "ミ",
    "ム", "メ", "モ", "ヤ", "ユ", "ヨ", "ラ", "リ",
    "ル", "レ", "ロ", "ワ", "ヲ", "ン", "ッ", "ャ",
    "ュ", "ョ",
    // 0xfe: corner quadrants
    "◜", "◝",
];
