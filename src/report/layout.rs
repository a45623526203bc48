//! Body composition for the clinical report.
//!
//! Turns summary text into blocks the PDF writer can draw without further
//! decisions: wrapped paragraphs, spacers, and placeholders for lines that
//! cannot be written with the active font.

use std::collections::HashSet;

use thiserror::Error;

use crate::ai::strip_markup_tags;

/// Prefix of the placeholder drawn in place of an unwritable line.
pub const PLACEHOLDER_LABEL: &str = "Yazılamadı";

/// Characters an embedded font maps to a real glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphSet {
    chars: HashSet<char>,
}

impl GlyphSet {
    /// Read the Unicode character maps of a TrueType/OpenType font.
    /// `None` when the data is not a font or maps no Unicode characters.
    pub fn from_font(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let cmap = face.tables().cmap?;

        let mut chars = HashSet::new();
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                let mapped = subtable.glyph_index(cp).is_some_and(|g| g.0 != 0);
                if let Some(c) = char::from_u32(cp).filter(|_| mapped) {
                    chars.insert(c);
                }
            });
        }
        (!chars.is_empty()).then_some(Self { chars })
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl FromIterator<char> for GlyphSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().collect(),
        }
    }
}

/// Character repertoire of the font the document is drawn with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontCoverage {
    /// Embedded TrueType font, limited to the characters its cmap maps.
    Embedded(GlyphSet),
    /// Built-in PDF font, text is limited to WinAnsiEncoding.
    WinAnsi,
}

impl FontCoverage {
    pub fn supports(&self, c: char) -> bool {
        match self {
            FontCoverage::Embedded(glyphs) => glyphs.contains(c),
            FontCoverage::WinAnsi => is_winansi(c),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("kontrol karakteri U+{0:04X}")]
    ControlCharacter(u32),

    #[error("'{0}' karakteri yazı tipinde yok")]
    UnsupportedCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyBlock {
    /// A summary line, already wrapped to the page width.
    Paragraph(Vec<String>),
    /// A line that could not be written, replaced by a visible notice.
    Unwritable { reason: String, lines: Vec<String> },
    /// A blank summary line: vertical space only.
    Spacer,
}

impl BodyBlock {
    pub fn lines(&self) -> &[String] {
        match self {
            BodyBlock::Paragraph(lines) | BodyBlock::Unwritable { lines, .. } => lines,
            BodyBlock::Spacer => &[],
        }
    }
}

/// Split a summary into drawable blocks, one per input line.
pub fn compose_body(summary: &str, coverage: &FontCoverage, max_chars: usize) -> Vec<BodyBlock> {
    summary
        .split('\n')
        .map(|raw| {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                return BodyBlock::Spacer;
            }
            match prepare_line(line, coverage) {
                Ok(text) => BodyBlock::Paragraph(wrap_text(&text, max_chars)),
                Err(e) => {
                    tracing::warn!(error = %e, "Report line could not be written");
                    let notice = format!("[{PLACEHOLDER_LABEL}: {e}]");
                    BodyBlock::Unwritable {
                        reason: e.to_string(),
                        lines: wrap_text(&encode_lossy(&notice, coverage), max_chars),
                    }
                }
            }
        })
        .collect()
}

/// Strip markup and check that the font has a glyph for every character.
pub fn prepare_line(line: &str, coverage: &FontCoverage) -> Result<String, LineError> {
    let text = fold_turkish(&strip_markup_tags(line).replace('\t', "    "), coverage);
    for c in text.chars() {
        if c.is_control() {
            return Err(LineError::ControlCharacter(c as u32));
        }
        if !coverage.supports(c) {
            return Err(LineError::UnsupportedCharacter(c));
        }
    }
    Ok(text)
}

/// Make arbitrary header/label text drawable, replacing what cannot be drawn.
pub fn encode_lossy(text: &str, coverage: &FontCoverage) -> String {
    fold_turkish(text, coverage)
        .chars()
        .map(|c| {
            if c.is_control() || !coverage.supports(c) {
                '?'
            } else {
                c
            }
        })
        .collect()
}

/// Replace Turkish letters the font lacks with their ASCII base letter.
fn fold_turkish(text: &str, coverage: &FontCoverage) -> String {
    text.chars()
        .map(|c| {
            if coverage.supports(c) {
                return c;
            }
            match c {
                'ş' => 's',
                'Ş' => 'S',
                'ğ' => 'g',
                'Ğ' => 'G',
                'ı' => 'i',
                'İ' => 'I',
                other => other,
            }
        })
        .collect()
}

fn is_winansi(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
        || matches!(
            c,
            '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž'
                | '‘' | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ'
                | 'ž' | 'Ÿ'
        )
}

/// Word-wrap on whitespace, counting characters. Words longer than a line
/// are split hard.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if current_len + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
