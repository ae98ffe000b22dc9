//! Glyph advance widths for the standard PDF fonts the engine uses.
//!
//! Values are the Adobe AFM widths in units of 1/1000 em. The ASCII tables
//! cover 0x20..=0x7E; Latin-1 letters with diacritics share the advance of
//! their base letter, which holds for every accented glyph in Helvetica
//! except the dotless-i family.

/// Helvetica, 0x20 (space) through 0x7E (asciitilde).
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20-0x2F
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30-0x3F
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40-0x4F
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50-0x5F
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60-0x6F
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70-0x7E
];

/// Helvetica-Bold, 0x20 (space) through 0x7E (asciitilde).
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20-0x2F
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30-0x3F
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40-0x4F
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50-0x5F
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60-0x6F
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70-0x7E
];

/// Width metrics for one standard font face.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
    bold: bool,
}

pub(crate) const HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_ASCII,
    bold: false,
};

pub(crate) const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_ASCII,
    bold: true,
};

impl StandardFontMetrics {
    /// Advance width of `ch` in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        self.known_advance(ch).unwrap_or_else(|| self.default_advance())
    }

    /// The AFM advance of `ch`, or `None` when the tables don't cover it.
    pub fn known_advance(&self, ch: char) -> Option<u16> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return Some(self.ascii[(cp - 0x20) as usize]);
        }
        if let Some(w) = self.special_advance(ch) {
            return Some(w);
        }
        base_letter(ch).map(|base| self.ascii[(base as u32 - 0x20) as usize])
    }

    /// The advance used for characters the encoder replaces with `?`.
    pub fn default_advance(&self) -> u16 {
        self.ascii[(b'?' - 0x20) as usize]
    }

    /// Width of a string in points at `font_size`.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.advance(c) as u32).sum();
        units as f64 * font_size / 1000.0
    }

    fn special_advance(&self, ch: char) -> Option<u16> {
        let (regular, bold) = match ch {
            '\u{00A0}' => (278, 278),
            '\u{00AD}' => (333, 333),
            'ß' => (611, 611),
            '°' => (400, 400),
            '²' | '³' | '¹' => (333, 333),
            '€' | '¢' | '£' | '¤' | '¥' => (556, 556),
            '–' => (556, 556),
            '—' | '…' | '‰' | '™' => (1000, 1000),
            '•' => (350, 350),
            '„' | '“' | '”' => (333, 500),
            '‘' | '’' | '‚' => (222, 278),
            '‹' | '›' => (333, 333),
            '«' | '»' => (556, 556),
            '§' | '†' | '‡' | 'ƒ' => (556, 556),
            '¶' => (537, 556),
            '©' | '®' => (737, 737),
            'µ' => (556, 611),
            '×' | '÷' | '±' | '¬' => (584, 584),
            '·' => (278, 278),
            '¦' => (260, 280),
            '¨' | '¯' | '´' | '¸' | 'ˆ' | '˜' => (333, 333),
            '¡' => (333, 333),
            '¿' => (611, 611),
            'ª' => (370, 370),
            'º' => (365, 365),
            '½' | '¼' | '¾' => (834, 834),
            'í' | 'ì' | 'î' | 'ï' => (278, 278),
            'æ' => (889, 889),
            'Æ' | 'Œ' => (1000, 1000),
            'œ' => (944, 944),
            'ø' => (611, 611),
            'Ø' => (778, 778),
            'Ð' => (722, 722),
            'Þ' => (667, 667),
            'ð' | 'þ' => (556, 611),
            _ => return None,
        };
        Some(if self.bold { bold } else { regular })
    }
}

/// Whether the width tables know `ch`. Both faces cover the same set, so the
/// encoder writes anything else as `?`.
pub fn is_covered(ch: char) -> bool {
    HELVETICA.known_advance(ch).is_some()
}

/// Map a Latin-1 letter with a diacritic to its base ASCII letter.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        'š' => 's',
        'Š' => 'S',
        'ž' => 'z',
        'Ž' => 'Z',
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_and_digits() {
        assert_eq!(HELVETICA.advance(' '), 278);
        assert_eq!(HELVETICA.advance('0'), 556);
        assert_eq!(HELVETICA_BOLD.advance('9'), 556);
    }

    #[test]
    fn table_alignment_spot_checks() {
        assert_eq!(HELVETICA.advance('@'), 1015);
        assert_eq!(HELVETICA.advance('W'), 944);
        assert_eq!(HELVETICA.advance('i'), 222);
        assert_eq!(HELVETICA.advance('~'), 584);
        assert_eq!(HELVETICA_BOLD.advance('@'), 975);
        assert_eq!(HELVETICA_BOLD.advance('m'), 889);
        assert_eq!(HELVETICA_BOLD.advance('z'), 500);
    }

    #[test]
    fn umlauts_share_base_width() {
        assert_eq!(HELVETICA.advance('ä'), HELVETICA.advance('a'));
        assert_eq!(HELVETICA.advance('Ö'), HELVETICA.advance('O'));
        assert_eq!(HELVETICA_BOLD.advance('ü'), HELVETICA_BOLD.advance('u'));
        assert_eq!(HELVETICA.advance('ß'), 611);
    }

    #[test]
    fn unknown_falls_back_to_question_mark() {
        assert_eq!(HELVETICA.advance('λ'), HELVETICA.advance('?'));
        assert_eq!(HELVETICA_BOLD.advance('漢'), HELVETICA_BOLD.advance('?'));
    }

    #[test]
    fn symbols_use_their_own_widths() {
        assert_eq!(HELVETICA.advance('™'), 1000);
        assert_eq!(HELVETICA.advance('Œ'), 1000);
        assert_eq!(HELVETICA.advance('¾'), 834);
        assert_eq!(HELVETICA.advance('±'), 584);
        assert_eq!(HELVETICA_BOLD.advance('¿'), 611);
        assert_eq!(HELVETICA_BOLD.advance('Š'), HELVETICA_BOLD.advance('S'));
        assert_eq!(HELVETICA.known_advance('λ'), None);
    }

    #[test]
    fn measure_sums_advances() {
        let w = HELVETICA.measure_string("Hi", 10.0);
        assert!((w - (722.0 + 222.0) / 100.0).abs() < 1e-9);
    }
}
