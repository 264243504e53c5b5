/// Status glyphs used as line prefixes. Plain Unicode only, no nerd font
/// codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Info,    // ℹ
    Check,   // ✓
    Warning, // ⚠
    Cross,   // ✗
    Arrow,   // →
}

impl Glyph {
    pub const fn unicode(&self) -> char {
        match self {
            Self::Info => '\u{2139}',
            Self::Check => '\u{2713}',
            Self::Warning => '\u{26a0}',
            Self::Cross => '\u{2717}',
            Self::Arrow => '\u{2192}',
        }
    }
}

impl From<Glyph> for char {
    fn from(glyph: Glyph) -> Self {
        glyph.unicode()
    }
}

impl std::fmt::Display for Glyph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unicode())
    }
}
