//! Block-letter font for the large clock.
//!
//! Glyphs are drawn with `#` for ink and space for paper, then the ink is
//! swapped for the fill character of the selected [`FontStyle`].

/// Glyph height in rows.
pub const GLYPH_HEIGHT: usize = 5;

const DIGITS: [[&str; GLYPH_HEIGHT]; 10] = [
    ["#####", "#   #", "#   #", "#   #", "#####"],
    ["  #  ", " ##  ", "  #  ", "  #  ", " ### "],
    ["#####", "    #", "#####", "#    ", "#####"],
    ["#####", "    #", " ####", "    #", "#####"],
    ["#   #", "#   #", "#####", "    #", "    #"],
    ["#####", "#    ", "#####", "    #", "#####"],
    ["#####", "#    ", "#####", "#   #", "#####"],
    ["#####", "    #", "   # ", "  #  ", "  #  "],
    ["#####", "#   #", "#####", "#   #", "#####"],
    ["#####", "#   #", "#####", "    #", "#####"],
];

const COLON: [&str; GLYPH_HEIGHT] = [" ", "#", " ", "#", " "];
const SPACE: [&str; GLYPH_HEIGHT] = ["  ", "  ", "  ", "  ", "  "];
const LETTER_A: [&str; GLYPH_HEIGHT] = [" ### ", "#   #", "#####", "#   #", "#   #"];
const LETTER_P: [&str; GLYPH_HEIGHT] = ["#### ", "#   #", "#### ", "#    ", "#    "];
const LETTER_M: [&str; GLYPH_HEIGHT] = ["#   #", "## ##", "# # #", "#   #", "#   #"];

/// Fill style for the block letters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Block,
    /// Hatched fill used by the cyberpunk font toggle.
    Cyber,
}

impl FontStyle {
    pub fn from_cyberpunk(enabled: bool) -> Self {
        if enabled {
            FontStyle::Cyber
        } else {
            FontStyle::Block
        }
    }

    fn ink(self) -> char {
        match self {
            FontStyle::Block => '█',
            FontStyle::Cyber => '▓',
        }
    }
}

fn glyph(c: char) -> &'static [&'static str; GLYPH_HEIGHT] {
    match c {
        '0'..='9' => &DIGITS[c as usize - '0' as usize],
        ':' => &COLON,
        'A' | 'a' => &LETTER_A,
        'P' | 'p' => &LETTER_P,
        'M' | 'm' => &LETTER_M,
        _ => &SPACE,
    }
}

/// Render `text` as `GLYPH_HEIGHT` lines of block letters.
///
/// Each glyph column is repeated `stretch` times (minimum 1) and glyphs
/// are separated by a single blank column.
pub fn render_big(text: &str, style: FontStyle, stretch: usize) -> Vec<String> {
    let stretch = stretch.max(1);
    let ink = style.ink();

    (0..GLYPH_HEIGHT)
        .map(|row| {
            let mut line = String::new();
            for (i, c) in text.chars().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                for cell in glyph(c)[row].chars() {
                    let out = if cell == '#' { ink } else { ' ' };
                    line.extend(std::iter::repeat_n(out, stretch));
                }
            }
            line
        })
        .collect()
}
