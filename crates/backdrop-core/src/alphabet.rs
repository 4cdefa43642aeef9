//! Glyph alphabets for the rain and the decrypt effect.

use rand::Rng;

/// Half-width katakana followed by the decimal digits.
pub const MATRIX_GLYPHS: &[char] = &[
    'ｱ', 'ｲ', 'ｳ', 'ｴ', 'ｵ', 'ｶ', 'ｷ', 'ｸ', 'ｹ', 'ｺ', 'ｻ', 'ｼ', 'ｽ', 'ｾ', 'ｿ', 'ﾀ',
    'ﾁ', 'ﾂ', 'ﾃ', 'ﾄ', 'ﾅ', 'ﾆ', 'ﾇ', 'ﾈ', 'ﾉ', 'ﾊ', 'ﾋ', 'ﾌ', 'ﾍ', 'ﾎ', 'ﾏ', 'ﾐ',
    'ﾑ', 'ﾒ', 'ﾓ', 'ﾔ', 'ﾕ', 'ﾖ', 'ﾗ', 'ﾘ', 'ﾙ', 'ﾚ', 'ﾛ', 'ﾜ', 'ﾝ', '0', '1', '2',
    '3', '4', '5', '6', '7', '8', '9',
];

/// Glyphs used in binary mode.
pub const BINARY_GLYPHS: &[char] = &['0', '1'];

/// Which set of glyphs the rain draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alphabet {
    #[default]
    Matrix,
    Binary,
}

impl Alphabet {
    /// Pick the alphabet for the binary-mode flag.
    pub fn from_binary(is_binary: bool) -> Self {
        if is_binary {
            Alphabet::Binary
        } else {
            Alphabet::Matrix
        }
    }

    /// All glyphs of this alphabet.
    pub fn glyphs(self) -> &'static [char] {
        match self {
            Alphabet::Matrix => MATRIX_GLYPHS,
            Alphabet::Binary => BINARY_GLYPHS,
        }
    }

    /// A uniformly chosen glyph.
    pub fn random_glyph(self, rng: &mut impl Rng) -> char {
        let glyphs = self.glyphs();
        glyphs[rng.random_range(0..glyphs.len())]
    }
}

/// Replace every character of `text` with a random matrix glyph.
pub fn scramble(text: &str, rng: &mut impl Rng) -> String {
    text.chars()
        .map(|_| Alphabet::Matrix.random_glyph(rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_binary_flag_selects_alphabet() {
        assert_eq!(Alphabet::from_binary(true).glyphs(), &['0', '1']);
        assert_eq!(Alphabet::from_binary(false), Alphabet::Matrix);
        assert_eq!(MATRIX_GLYPHS.len(), 55);
    }

    #[test]
    fn test_scramble_keeps_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let scrambled = scramble("Follow the white rabbit", &mut rng);
        assert_eq!(scrambled.chars().count(), 23);
        assert!(scrambled.chars().all(|c| MATRIX_GLYPHS.contains(&c)));
    }
}
