//! The Unicode blocks behind each bit of the OS/2 `ulUnicodeRange` bitmap.
//!
//! Bit assignments follow the [OS/2 specification](https://learn.microsoft.com/en-us/typography/opentype/spec/os2#ulunicoderange1-bits-031ulunicoderange2-bits-3263ulunicoderange3-bits-6495ulunicoderange4-bits-96127).
//! A bit index is part of the file format: entries may be added, never renumbered.

use std::fmt::{self, Display, Formatter};

/// An inclusive range of code points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePointRange {
    pub start: u32,
    pub end: u32,
}

impl CodePointRange {
    pub fn contains(&self, code_point: u32) -> bool {
        (self.start..=self.end).contains(&code_point)
    }
}

/// Formats as `U+0400-04FF`
impl Display for CodePointRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}-{:04X}", self.start, self.end)
    }
}

/// One entry of the catalog: a bitmap bit and the blocks it stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeSupport {
    pub bit_index: u8,
    pub name: &'static str,
    pub ranges: &'static [CodePointRange],
}

impl UnicodeSupport {
    /// Tests this entry's bit in a 128-bit bitmap stored as four words,
    /// bit 0 being the least significant bit of the first word.
    pub fn is_supported(&self, bitmap: &[u32; 4]) -> bool {
        let word = usize::from(self.bit_index / 32);
        let shift = self.bit_index % 32;
        bitmap
            .get(word)
            .is_some_and(|bits| (bits >> shift) & 1 == 1)
    }

    pub fn contains(&self, code_point: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(code_point))
    }
}

macro_rules! block {
    ($bit:literal, $name:literal, [$($start:literal..=$end:literal),+ $(,)?]) => {
        UnicodeSupport {
            bit_index: $bit,
            name: $name,
            ranges: &[$(CodePointRange { start: $start, end: $end }),+],
        }
    };
}

/// Every assigned bit, in a fixed declaration order.
///
/// The order is close to, but not exactly, bit order; lookups that emit
/// several entries follow this order.
pub static UNICODE_RANGES: [UnicodeSupport; 123] = [
    block!(0, "Basic Latin", [0x0000..=0x007F]),
    block!(1, "Latin-1 Supplement", [0x0080..=0x00FF]),
    block!(2, "Latin Extended-A", [0x0100..=0x017F]),
    block!(3, "Latin Extended-B", [0x0180..=0x024F]),
    block!(
        4,
        "IPA & Phonetic Extensions/Supplements",
        [
            0x0250..=0x02AF,
            0x1D00..=0x1D7F,
            0x1D80..=0x1DBF,
        ]
    ),
    block!(5, "Spacing Modifier Letters", [0x02B0..=0x02FF, 0xA700..=0xA71F]),
    block!(6, "Combining Diacritical Marks & Supplements", [0x0300..=0x036F, 0x1DC0..=0x1DFF]),
    block!(7, "Greek and Coptic", [0x0370..=0x03FF]),
    block!(8, "Coptic", [0x2C80..=0x2CFF]),
    block!(9, "Cyrillic", [0x0400..=0x04FF, 0x0500..=0x052F, 0x2DE0..=0x2DFF, 0xA640..=0xA69F]),
    block!(10, "Armenian", [0x0530..=0x058F]),
    block!(11, "Hebrew", [0x0590..=0x05FF]),
    block!(13, "Arabic", [0x0600..=0x06FF, 0x0750..=0x077F]),
    block!(12, "Vai", [0xA500..=0xA63F]),
    block!(14, "NKo", [0x07C0..=0x07FF]),
    block!(15, "Devanagari", [0x0900..=0x097F]),
    block!(16, "Bengali", [0x0980..=0x09FF]),
    block!(17, "Gurmukhi", [0x0A00..=0x0A7F]),
    block!(18, "Gujarati", [0x0A80..=0x0AFF]),
    block!(19, "Oriya", [0x0B00..=0x0B7F]),
    block!(20, "Tamil", [0x0B80..=0x0BFF]),
    block!(21, "Telugu", [0x0C00..=0x0C7F]),
    block!(22, "Kannada", [0x0C80..=0x0CFF]),
    block!(23, "Malayalam", [0x0D00..=0x0D7F]),
    block!(24, "Thai", [0x0E00..=0x0E7F]),
    block!(25, "Lao", [0x0E80..=0x0EFF]),
    block!(26, "Georgian and supplement", [0x10A0..=0x10FF, 0x2D00..=0x2D2F]),
    block!(27, "Balinese", [0x1B00..=0x1B7F]),
    block!(28, "Hangul Jamo", [0x1100..=0x11FF]),
    block!(29, "Latin Extended Additional", [0x1E00..=0x1EFF, 0x2C60..=0x2C7F, 0xA720..=0xA7FF]),
    block!(30, "Greek Extended", [0x1F00..=0x1FFF]),
    block!(31, "General & Supplemental Punctuation", [0x2000..=0x206F, 0x2E00..=0x2E7F]),
    block!(32, "Superscripts And Subscripts", [0x2070..=0x209F]),
    block!(33, "Currency Symbols", [0x20A0..=0x20CF]),
    block!(34, "Combining Diacritical Marks For Symbols", [0x20D0..=0x20FF]),
    block!(35, "Letterlike Symbols", [0x2100..=0x214F]),
    block!(36, "Number Forms", [0x2150..=0x218F]),
    block!(37, "Arrows", [0x2190..=0x21FF, 0x27F0..=0x27FF, 0x2900..=0x297F, 0x2B00..=0x2BFF]),
    block!(
        38,
        "Mathematical Operators",
        [
            0x2200..=0x22FF,
            0x2A00..=0x2AFF,
            0x27C0..=0x27EF,
            0x2980..=0x29FF,
        ]
    ),
    block!(39, "Miscellaneous Technical", [0x2300..=0x23FF]),
    block!(40, "Control Pictures", [0x2400..=0x243F]),
    block!(41, "Optical Character Recognition", [0x2440..=0x245F]),
    block!(42, "Enclosed Alphanumerics", [0x2460..=0x24FF]),
    block!(43, "Box Drawing", [0x2500..=0x257F]),
    block!(44, "Block Elements", [0x2580..=0x259F]),
    block!(45, "Geometric Shapes", [0x25A0..=0x25FF]),
    block!(46, "Miscellaneous Symbols", [0x2600..=0x26FF]),
    block!(47, "Dingbats", [0x2700..=0x27BF]),
    block!(48, "CJK Symbols And Punctuation", [0x3000..=0x303F]),
    block!(49, "Hiragana", [0x3040..=0x309F]),
    block!(50, "Katakana & Phonetic Extensions", [0x30A0..=0x30FF, 0x31F0..=0x31FF]),
    block!(51, "Bopomofo & Extended", [0x3100..=0x312F, 0x31A0..=0x31BF]),
    block!(52, "Hangul Compatibility Jamo", [0x3130..=0x318F]),
    block!(53, "Phags-pa", [0xA840..=0xA87F]),
    block!(54, "Enclosed CJK Letters And Months", [0x3200..=0x32FF]),
    block!(55, "CJK Compatibility", [0x3300..=0x33FF]),
    block!(56, "Hangul Syllables", [0xAC00..=0xD7AF]),
    block!(57, "Non-Plane 0", [0x10000..=0x10FFFF]),
    block!(58, "Phoenician", [0x10900..=0x1091F]),
    block!(
        59,
        "CJK Ideographs & Radicals",
        [
            0x4E00..=0x9FFF,
            0x2E80..=0x2EFF,
            0x2F00..=0x2FDF,
            0x2FF0..=0x2FFF,
            0x3400..=0x4DBF,
            0x20000..=0x2A6DF,
            0x3190..=0x319F,
        ]
    ),
    block!(60, "Private Use Area Plane 0", [0xE000..=0xF8FF]),
    block!(61, "CJK Strokes", [0x31C0..=0x31EF, 0xF900..=0xFAFF, 0x2F800..=0x2FA1F]),
    block!(62, "Alphabetic Presentation Forms", [0xFB00..=0xFB4F]),
    block!(63, "Arabic Presentation Forms-A", [0xFB50..=0xFDFF]),
    block!(64, "Combining Half Marks", [0xFE20..=0xFE2F]),
    block!(66, "Small Form Variants", [0xFE50..=0xFE6F]),
    block!(65, "Vertical Forms", [0xFE10..=0xFE1F, 0xFE30..=0xFE4F]),
    block!(67, "Arabic Presentation Forms-B", [0xFE70..=0xFEFF]),
    block!(68, "Halfwidth And Fullwidth Forms", [0xFF00..=0xFFEF]),
    block!(69, "Specials", [0xFFF0..=0xFFFF]),
    block!(70, "Tibetan", [0x0F00..=0x0FFF]),
    block!(71, "Syriac", [0x0700..=0x074F]),
    block!(72, "Thaana", [0x0780..=0x07BF]),
    block!(73, "Sinhala", [0x0D80..=0x0DFF]),
    block!(74, "Myanmar", [0x1000..=0x109F]),
    block!(75, "Ethiopic", [0x1200..=0x137F, 0x1380..=0x139F, 0x2D80..=0x2DDF]),
    block!(76, "Cherokee", [0x13A0..=0x13FF]),
    block!(77, "Unified Canadian Aboriginal Syllabics", [0x1400..=0x167F]),
    block!(78, "Ogham", [0x1680..=0x169F]),
    block!(79, "Runic", [0x16A0..=0x16FF]),
    block!(80, "Khmer", [0x1780..=0x17FF, 0x19E0..=0x19FF]),
    block!(81, "Mongolian", [0x1800..=0x18AF]),
    block!(83, "Yi Syllables & Radicals", [0xA000..=0xA48F, 0xA490..=0xA4CF]),
    block!(82, "Braille Patterns", [0x2800..=0x28FF]),
    block!(
        84,
        "Tagalog And Related",
        [
            0x1700..=0x171F,
            0x1720..=0x173F,
            0x1740..=0x175F,
            0x1760..=0x177F,
        ]
    ),
    block!(85, "Old Italic", [0x10300..=0x1032F]),
    block!(86, "Gothic", [0x10330..=0x1034F]),
    block!(88, "Musical Symbols", [0x1D000..=0x1D0FF, 0x1D100..=0x1D1FF, 0x1D200..=0x1D24F]),
    block!(87, "Deseret", [0x10400..=0x1044F]),
    block!(89, "Mathematical Alphanumeric Symbols", [0x1D400..=0x1D7FF]),
    block!(90, "Private Use (plane 15 & 16)", [0xF0000..=0xFFFFD, 0x100000..=0x10FFFD]),
    block!(91, "Variation Selectors", [0xFE00..=0xFE0F, 0xE0100..=0xE01EF]),
    block!(92, "Tags", [0xE0000..=0xE007F]),
    block!(93, "Limbu", [0x1900..=0x194F]),
    block!(94, "Tai Le", [0x1950..=0x197F]),
    block!(95, "New Tai Lue", [0x1980..=0x19DF]),
    block!(97, "Glagolitic", [0x2C00..=0x2C5F]),
    block!(98, "Tifinagh", [0x2D30..=0x2D7F]),
    block!(96, "Buginese", [0x1A00..=0x1A1F]),
    block!(99, "Yijing Hexagram Symbols", [0x4DC0..=0x4DFF]),
    block!(100, "Syloti Nagri", [0xA800..=0xA82F]),
    block!(
        101,
        "Linear B Syllabary & Aegean",
        [
            0x10000..=0x1007F,
            0x10080..=0x100FF,
            0x10100..=0x1013F,
        ]
    ),
    block!(102, "Ancient Greek Numbers", [0x10140..=0x1018F]),
    block!(103, "Ugaritic", [0x10380..=0x1039F]),
    block!(104, "Old Persian", [0x103A0..=0x103DF]),
    block!(105, "Shavian", [0x10450..=0x1047F]),
    block!(106, "Osmanya", [0x10480..=0x104AF]),
    block!(107, "Cypriot Syllabary", [0x10800..=0x1083F]),
    block!(108, "Kharoshthi", [0x10A00..=0x10A5F]),
    block!(109, "Tai Xuan Jing Symbols", [0x1D300..=0x1D35F]),
    block!(110, "Cuneiform", [0x12000..=0x123FF, 0x12400..=0x1247F]),
    block!(111, "Counting Rod Numerals", [0x1D360..=0x1D37F]),
    block!(112, "Sundanese", [0x1B80..=0x1BBF]),
    block!(113, "Lepcha", [0x1C00..=0x1C4F]),
    block!(114, "Ol Chiki", [0x1C50..=0x1C7F]),
    block!(115, "Saurashtra", [0xA880..=0xA8DF]),
    block!(116, "Kayah Li", [0xA900..=0xA92F]),
    block!(117, "Rejang", [0xA930..=0xA95F]),
    block!(118, "Cham", [0xAA00..=0xAA5F]),
    block!(119, "Ancient Symbols", [0x10190..=0x101CF]),
    block!(120, "Phaistos Disc", [0x101D0..=0x101FF]),
    block!(121, "Carian Lycian Lydian", [0x102A0..=0x102DF, 0x10280..=0x1029F, 0x10920..=0x1093F]),
    block!(122, "Domino & Mahjong Tiles", [0x1F030..=0x1F09F, 0x1F000..=0x1F02F]),
];

/// Returns the catalog entry for `bit`, if the bit is assigned
pub fn block_for_bit(bit: u8) -> Option<&'static UnicodeSupport> {
    UNICODE_RANGES.iter().find(|block| block.bit_index == bit)
}

/// The entries whose bit is set in `bitmap`, in catalog order
pub fn supported_blocks(bitmap: &[u32; 4]) -> impl Iterator<Item = &'static UnicodeSupport> + '_ {
    UNICODE_RANGES
        .iter()
        .filter(move |block| block.is_supported(bitmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn every_assigned_bit_appears_once() {
        let bits: BTreeSet<u8> = UNICODE_RANGES.iter().map(|b| b.bit_index).collect();
        assert_eq!(bits.len(), UNICODE_RANGES.len());
        assert_eq!(bits, (0..=122).collect::<BTreeSet<u8>>());
    }

    #[test]
    fn ranges_are_well_formed() {
        for block in UNICODE_RANGES.iter() {
            assert!(!block.ranges.is_empty(), "{}", block.name);
            for range in block.ranges {
                assert!(range.start <= range.end, "{}: {range}", block.name);
                assert!(range.end <= 0x10FFFF, "{}: {range}", block.name);
            }
        }
    }

    #[test]
    fn names_are_unique() {
        let names: BTreeSet<&str> = UNICODE_RANGES.iter().map(|b| b.name).collect();
        assert_eq!(names.len(), UNICODE_RANGES.len());
    }

    #[test]
    fn catalog_order_is_not_bit_order() {
        let arabic = UNICODE_RANGES.iter().position(|b| b.bit_index == 13).unwrap();
        let vai = UNICODE_RANGES.iter().position(|b| b.bit_index == 12).unwrap();
        assert!(arabic < vai);
    }

    #[test]
    fn bit_test_uses_word_and_shift() {
        let cyrillic = block_for_bit(9).unwrap();
        assert_eq!(cyrillic.name, "Cyrillic");
        assert!(cyrillic.is_supported(&[1 << 9, 0, 0, 0]));
        assert!(!cyrillic.is_supported(&[0, 1 << 9, 0, 0]));

        let cham = block_for_bit(118).unwrap();
        assert!(cham.is_supported(&[0, 0, 0, 1 << 22]));
        assert!(cham.contains(0xAA10));
        assert!(!cham.contains(0xAA60));
    }

    #[test]
    fn formatting() {
        let musical = block_for_bit(88).unwrap();
        let formatted: Vec<String> = musical.ranges.iter().map(ToString::to_string).collect();
        assert_eq!(
            formatted,
            ["U+1D000-1D0FF", "U+1D100-1D1FF", "U+1D200-1D24F"]
        );
        assert_eq!(block_for_bit(0).unwrap().ranges[0].to_string(), "U+0000-007F");
    }

    #[test]
    fn reserved_bits_are_unassigned() {
        assert!(block_for_bit(123).is_none());
        assert_eq!(supported_blocks(&[0, 0, 0, 0xF800_0000]).count(), 0);
    }
}
