//! Static Alt-key to APL glyph mapping.
//!
//! The table covers the 7-bit input space (0..128). Each mapped entry is a
//! single APL character whose UTF-8 encoding is at most [`MAX_GLYPH_BYTES`]
//! long; unmapped entries mean "no translation". Bytes with the high bit set
//! are never looked up here.

/// Longest UTF-8 encoding a glyph may have (RFC 3629).
pub const MAX_GLYPH_BYTES: usize = 4;

/// Number of entries in the table: the 7-bit key space.
const TABLE_SIZE: usize = 128;

/// The key/glyph pairs of the standard APL layout. Everything not listed
/// here (control characters, digits' neighbors like `F`, `G`, `H`, ...)
/// passes through untranslated.
const APL_PAIRS: &[(u8, &str)] = &[
    (b'!', "\u{2336}"),  // ⌶ I-beam
    (b'"', "\u{2262}"),  // ≢ not identical
    (b'#', "\u{2352}"),  // ⍒ grade down
    (b'$', "\u{234B}"),  // ⍋ grade up
    (b'%', "\u{233D}"),  // ⌽ circle stile
    (b'&', "\u{2296}"),  // ⊖ circled minus
    (b'\'', "\u{2355}"), // ⍕ thorn
    (b'(', "\u{2371}"),  // ⍱ nor
    (b')', "\u{2372}"),  // ⍲ nand
    (b'*', "\u{235F}"),  // ⍟ circle star
    (b'+', "\u{2339}"),  // ⌹ domino
    (b',', "\u{235D}"),  // ⍝ lamp
    (b'-', "\u{00D7}"),  // × times
    (b'.', "\u{2340}"),  // ⍀ backslash bar
    (b'/', "\u{233F}"),  // ⌿ slash bar
    (b'0', "\u{2227}"),  // ∧ and
    (b'1', "\u{00A8}"),  // ¨ dieresis
    (b'2', "\u{00AF}"),  // ¯ high minus
    (b'3', "<"),
    (b'4', "\u{2264}"),  // ≤
    (b'5', "="),
    (b'6', "\u{2265}"),  // ≥
    (b'7', ">"),
    (b'8', "\u{2260}"),  // ≠
    (b'9', "\u{2228}"),  // ∨ or
    (b':', "\u{2261}"),  // ≡ identical
    (b';', "\u{234E}"),  // ⍎ execute
    (b'<', "\u{236A}"),  // ⍪ comma bar
    (b'=', "\u{00F7}"),  // ÷ divide
    (b'>', "\u{2359}"),  // ⍙ delta underbar
    (b'?', "\u{2360}"),  // ⍠ quad colon
    (b'@', "\u{236B}"),  // ⍫ del tilde
    (b'A', "\u{2376}"),  // ⍶ alpha underbar
    (b'B', "\u{00A3}"),  // £
    (b'C', "\u{2367}"),  // ⍧ left shoe stile
    (b'D', "\u{25CA}"),  // ◊ diamond
    (b'E', "\u{2377}"),  // ⍷ epsilon underbar
    (b'I', "\u{2378}"),  // ⍸ iota underbar
    (b'J', "\u{2364}"),  // ⍤ jot dieresis
    (b'K', "\u{2338}"),  // ⌸ quad equal
    (b'L', "\u{2337}"),  // ⌷ squish quad
    (b'O', "\u{2365}"),  // ⍥ circle dieresis
    (b'P', "\u{2363}"),  // ⍣ star dieresis
    (b'T', "\u{2368}"),  // ⍨ tilde dieresis
    (b'U', "\u{20AC}"),  // €
    (b'W', "\u{2379}"),  // ⍹ omega underbar
    (b'X', "\u{03C7}"),  // χ chi
    (b'Y', "\u{00A5}"),  // ¥
    (b'[', "\u{2190}"),  // ← assign
    (b'\\', "\u{22A2}"), // ⊢ right tack
    (b']', "\u{2192}"),  // → branch
    (b'^', "\u{2349}"),  // ⍉ transpose
    (b'_', "!"),
    (b'`', "\u{25CA}"),  // ◊ diamond
    (b'a', "\u{237A}"),  // ⍺ alpha
    (b'b', "\u{22A5}"),  // ⊥ decode
    (b'c', "\u{2229}"),  // ∩ intersection
    (b'd', "\u{230A}"),  // ⌊ floor
    (b'e', "\u{220A}"),  // ∊ member
    (b'f', "_"),
    (b'g', "\u{2207}"),  // ∇ del
    (b'h', "\u{2206}"),  // ∆ delta
    (b'i', "\u{2373}"),  // ⍳ iota
    (b'j', "\u{2218}"),  // ∘ jot
    (b'k', "'"),
    (b'l', "\u{2395}"),  // ⎕ quad
    (b'm', "|"),
    (b'n', "\u{22A4}"),  // ⊤ encode
    (b'o', "\u{25CB}"),  // ○ circle
    (b'p', "\u{22C6}"),  // ⋆ star
    (b'q', "?"),
    (b'r', "\u{2374}"),  // ⍴ rho
    (b's', "\u{2308}"),  // ⌈ ceiling
    (b't', "\u{223C}"),  // ∼ tilde
    (b'u', "\u{2193}"),  // ↓ drop
    (b'v', "\u{222A}"),  // ∪ union
    (b'w', "\u{2375}"),  // ⍵ omega
    (b'x', "\u{2283}"),  // ⊃ disclose
    (b'y', "\u{2191}"),  // ↑ take
    (b'z', "\u{2282}"),  // ⊂ enclose
    (b'{', "\u{235E}"),  // ⍞ quote quad
    (b'|', "\u{22A3}"),  // ⊣ left tack
    (b'}', "\u{236C}"),  // ⍬ zilde
];

/// Immutable byte → glyph lookup table for the 7-bit key space.
pub struct Keymap {
    entries: [Option<&'static str>; TABLE_SIZE],
}

impl Keymap {
    /// Build the standard APL layout.
    ///
    /// Validates the whole table once: every glyph must encode to at most
    /// [`MAX_GLYPH_BYTES`] bytes, and every key must be 7-bit. Both are
    /// invariants of the static pair list, checked here so a bad edit fails
    /// at startup rather than corrupting the byte stream mid-session.
    pub fn apl() -> Self {
        let mut entries = [None; TABLE_SIZE];
        for &(key, glyph) in APL_PAIRS {
            assert!((key as usize) < TABLE_SIZE, "key {key:#04x} outside 7-bit space");
            assert!(
                glyph.len() <= MAX_GLYPH_BYTES,
                "glyph for {key:#04x} encodes to {} bytes",
                glyph.len()
            );
            entries[key as usize] = Some(glyph);
        }
        Self { entries }
    }

    /// Look up the translation for a 7-bit input byte.
    /// Returns `None` for unmapped entries and for any byte >= 0x80.
    pub fn lookup(&self, byte: u8) -> Option<&'static str> {
        self.entries.get(byte as usize).copied().flatten()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::apl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_glyphs_within_length_bound() {
        let map = Keymap::apl();
        for byte in 0u8..128 {
            if let Some(glyph) = map.lookup(byte) {
                assert!(
                    glyph.len() <= MAX_GLYPH_BYTES,
                    "glyph for {byte:#04x} too long"
                );
                assert!(!glyph.is_empty());
            }
        }
    }

    #[test]
    fn test_control_chars_unmapped() {
        let map = Keymap::apl();
        for byte in 0u8..0x20 {
            assert_eq!(map.lookup(byte), None);
        }
    }

    #[test]
    fn test_known_translations() {
        let map = Keymap::apl();
        assert_eq!(map.lookup(b'h'), Some("\u{2206}")); // Alt-h is delta
        assert_eq!(map.lookup(b'T'), Some("\u{2368}")); // Alt-T is tilde dieresis
        assert_eq!(map.lookup(b'r'), Some("\u{2374}")); // Alt-r is rho
        assert_eq!(map.lookup(b'['), Some("\u{2190}")); // Alt-[ is assign
    }

    #[test]
    fn test_unmapped_letters() {
        let map = Keymap::apl();
        for byte in [b'F', b'G', b'H', b'M', b'N', b'Q', b'R', b'S', b'V', b'Z'] {
            assert_eq!(map.lookup(byte), None);
        }
    }

    #[test]
    fn test_high_bit_bytes_unmapped() {
        let map = Keymap::apl();
        for byte in [0x80u8, 0xA0, 0xFF] {
            assert_eq!(map.lookup(byte), None);
        }
    }
}
