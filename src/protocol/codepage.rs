//! # Single-Byte Code Page
//!
//! Star portable printers in ESC/POS mode come out of `ESC @` on code
//! table 0, PC437. Text runs are sent as PC437 bytes, so Unicode strings
//! are transcoded before they become a [`crate::job::PrintPrimitive::Text`].
//!
//! | Range | Content |
//! |-------|---------|
//! | 00-7F | ASCII, unchanged |
//! | 80-AF | Accented Latin, currency, Spanish punctuation, fractions |
//! | B0-DF | Shades, box drawing, block elements |
//! | E0-FF | Greek, math symbols, degree, no-break space |
//!
//! A character outside the table is an error, never a substitution.

use crate::error::EncodingError;

/// Name used in [`EncodingError::UnmappableText`].
pub const PC437: &str = "PC437";

/// Upper half of PC437, indexed by `byte - 0x80`.
const UPPER_HALF: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', // 80
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', // 90
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', // A0
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', // B0
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', // C0
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', // D0
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', // E0
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}', // F0
];

/// PC437 byte for one character.
pub fn to_pc437(ch: char) -> Option<u8> {
    if ch.is_ascii() {
        return Some(ch as u8);
    }
    UPPER_HALF
        .iter()
        .position(|&c| c == ch)
        .map(|i| 0x80 + i as u8)
}

/// # Encode a String as PC437
///
/// ## Example
///
/// ```
/// use estrellita::protocol::codepage::encode;
///
/// assert_eq!(encode("Café").unwrap(), vec![b'C', b'a', b'f', 0x82]);
/// assert!(encode("5 €").is_err());
/// ```
///
/// ## Errors
///
/// [`EncodingError::UnmappableText`] for the first character PC437 lacks.
pub fn encode(content: &str) -> Result<Vec<u8>, EncodingError> {
    content
        .chars()
        .map(|ch| to_pc437(ch).ok_or(EncodingError::UnmappableText { charset: PC437 }))
        .collect()
}
