//! The [OS/2](https://learn.microsoft.com/en-us/typography/opentype/spec/os2) table

use std::fmt::{self, Display, Formatter};

use log::{debug, warn};

use crate::{
    buffer::{BeBufReader, BeBufReaderError, BeRecord},
    types::Tag,
};

use super::{
    DecodeError, Table, TableKind,
    unicode_ranges::{self, UnicodeSupport},
};

/// 'OS/2'
pub const TAG: Tag = Tag::new(b"OS/2");

/// Every version shares these leading 68 bytes, up to `usLastCharIndex`.
pub const FIXED_BLOCK_LEN: usize = 68;

const WEIGHT_CLASS_NAMES: [&str; 9] = [
    "Ultra-light",
    "Extra-light",
    "Light",
    "Semi-light",
    "Medium",
    "Semi-bold",
    "Bold",
    "Extra-bold",
    "Ultra-bold",
];

const WIDTH_CLASS_NAMES: [&str; 9] = [
    "Ultra-condensed",
    "Extra-condensed",
    "Condensed",
    "Semi-condensed",
    "Medium",
    "Semi-expanded",
    "Expanded",
    "Extra-expanded",
    "Ultra-expanded",
];

/// Names a `usWeightClass` value.
///
/// The legacy 1..=9 scale maps to a named bucket, anything else (typically
/// the 100..=900 scale) is reported as the number itself.
pub fn weight_class_name(weight: u16) -> String {
    match weight {
        1..=9 => WEIGHT_CLASS_NAMES[usize::from(weight - 1)].to_string(),
        _ => weight.to_string(),
    }
}

/// Names a `usWidthClass` value, `"Unknown"` outside of 1..=9.
pub fn width_class_name(width: u16) -> &'static str {
    match width {
        1..=9 => WIDTH_CLASS_NAMES[usize::from(width - 1)],
        _ => "Unknown",
    }
}

/// The `fsSelection` bit field
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct SelectionFlags(u16);

impl SelectionFlags {
    /// Bit 0: glyphs are italic.
    pub const ITALIC: Self = Self(1 << 0);
    /// Bit 1: glyphs are underscored.
    pub const UNDERSCORE: Self = Self(1 << 1);
    /// Bit 2: glyphs have their foreground and background reversed.
    pub const NEGATIVE: Self = Self(1 << 2);
    /// Bit 3: outline (hollow) glyphs.
    pub const OUTLINED: Self = Self(1 << 3);
    /// Bit 4: glyphs are overstruck.
    pub const STRIKEOUT: Self = Self(1 << 4);
    /// Bit 5: glyphs are emboldened.
    pub const BOLD: Self = Self(1 << 5);
    /// Bit 6: glyphs are in the standard weight/style for the font.
    pub const REGULAR: Self = Self(1 << 6);
    /// Bit 7: line metrics should come from the typographic fields.
    pub const USE_TYPO_METRICS: Self = Self(1 << 7);
    /// Bit 8: the font has name table strings consistent with a weight/width/slope family.
    pub const WWS: Self = Self(1 << 8);
    /// Bit 9: the font contains oblique glyphs.
    pub const OBLIQUE: Self = Self(1 << 9);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every bit of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for SelectionFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SelectionFlags({:#06X})", self.0)
    }
}

/// The single style label derived from the selection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "lowercase"))]
pub enum FontStyle {
    Italic,
    Bold,
    Underscore,
    Outlined,
    Strikeout,
    Negative,
    Normal,
}

impl FontStyle {
    /// Picks one label even when several bits are set, testing
    /// italic, bold, underscore, outlined, strikeout and negative in that order.
    pub fn from_flags(flags: SelectionFlags) -> Self {
        const PRIORITY: [(SelectionFlags, FontStyle); 6] = [
            (SelectionFlags::ITALIC, FontStyle::Italic),
            (SelectionFlags::BOLD, FontStyle::Bold),
            (SelectionFlags::UNDERSCORE, FontStyle::Underscore),
            (SelectionFlags::OUTLINED, FontStyle::Outlined),
            (SelectionFlags::STRIKEOUT, FontStyle::Strikeout),
            (SelectionFlags::NEGATIVE, FontStyle::Negative),
        ];

        PRIORITY
            .iter()
            .find(|(flag, _)| flags.contains(*flag))
            .map_or(FontStyle::Normal, |(_, style)| *style)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Italic => "italic",
            FontStyle::Bold => "bold",
            FontStyle::Underscore => "underscore",
            FontStyle::Outlined => "outlined",
            FontStyle::Strikeout => "strikeout",
            FontStyle::Negative => "negative",
            FontStyle::Normal => "normal",
        }
    }
}

impl Display for FontStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `fsType` embedding licensing bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct EmbeddingPermissions(u16);

/// How a font may be embedded, from bits 0..=3 of `fsType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingUsage {
    Installable,
    RestrictedLicense,
    PreviewAndPrint,
    Editable,
}

impl EmbeddingPermissions {
    const USAGE_MASK: u16 = 0x000F;
    const RESTRICTED_LICENSE: u16 = 0x0002;
    const PREVIEW_AND_PRINT: u16 = 0x0004;
    const EDITABLE: u16 = 0x0008;
    const NO_SUBSETTING: u16 = 0x0100;
    const BITMAP_ONLY: u16 = 0x0200;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The usage level; when a font sets several of the exclusive bits,
    /// the least restrictive one applies.
    pub fn usage(self) -> EmbeddingUsage {
        let usage = self.0 & Self::USAGE_MASK;
        if usage & Self::EDITABLE != 0 {
            EmbeddingUsage::Editable
        } else if usage & Self::PREVIEW_AND_PRINT != 0 {
            EmbeddingUsage::PreviewAndPrint
        } else if usage & Self::RESTRICTED_LICENSE != 0 {
            EmbeddingUsage::RestrictedLicense
        } else {
            EmbeddingUsage::Installable
        }
    }

    pub fn no_subsetting(self) -> bool {
        self.0 & Self::NO_SUBSETTING != 0
    }

    pub fn bitmap_embedding_only(self) -> bool {
        self.0 & Self::BITMAP_ONLY != 0
    }
}

impl fmt::Debug for EmbeddingPermissions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EmbeddingPermissions({:#06X})", self.0)
    }
}

/// The 10-byte PANOSE classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Panose {
    pub family_type: u8,
    pub serif_style: u8,
    pub weight: u8,
    pub proportion: u8,
    pub contrast: u8,
    pub stroke_variation: u8,
    pub arm_style: u8,
    pub letterform: u8,
    pub midline: u8,
    pub x_height: u8,
}

impl BeRecord for Panose {
    const SIZE: usize = 10;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            family_type: reader.read_u8()?,
            serif_style: reader.read_u8()?,
            weight: reader.read_u8()?,
            proportion: reader.read_u8()?,
            contrast: reader.read_u8()?,
            stroke_variation: reader.read_u8()?,
            arm_style: reader.read_u8()?,
            letterform: reader.read_u8()?,
            midline: reader.read_u8()?,
            x_height: reader.read_u8()?,
        })
    }
}

/// Vertical metrics present from version 0 on (when the table is 78 bytes or more)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Os2Metrics {
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
}

impl BeRecord for Os2Metrics {
    const SIZE: usize = 10;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            typo_ascender: reader.read_i16()?,
            typo_descender: reader.read_i16()?,
            typo_line_gap: reader.read_i16()?,
            win_ascent: reader.read_u16()?,
            win_descent: reader.read_u16()?,
        })
    }
}

/// Fields added by version 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Os2ExtendedMetrics {
    pub x_height: i16,
    pub cap_height: i16,
    pub default_char: u16,
    pub break_char: u16,
    pub max_context: u16,
}

impl BeRecord for Os2ExtendedMetrics {
    const SIZE: usize = 10;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            x_height: reader.read_i16()?,
            cap_height: reader.read_i16()?,
            default_char: reader.read_u16()?,
            break_char: reader.read_u16()?,
            max_context: reader.read_u16()?,
        })
    }
}

/// Version 5 optical size range, in TWIPs (1/20 point)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpticalSizeRange {
    pub lower_point_size: u16,
    pub upper_point_size: u16,
}

impl BeRecord for OpticalSizeRange {
    const SIZE: usize = 4;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            lower_point_size: reader.read_u16()?,
            upper_point_size: reader.read_u16()?,
        })
    }
}

/// A decoded OS/2 table.
///
/// The trailing blocks are `None` when the table's version does not define
/// them or when the table ends before them; `None` means unknown, not zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: EmbeddingPermissions,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: Panose,
    /// Always four words, whatever the version
    pub ul_unicode_range: [u32; 4],
    pub ach_vend_id: Tag,
    pub fs_selection: SelectionFlags,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,

    /// Version 0 and later
    pub metrics: Option<Os2Metrics>,
    /// Version 1 and later: `ulCodePageRange1` and `ulCodePageRange2`
    pub code_page_range: Option<[u32; 2]>,
    /// Version 2 and later
    pub extended: Option<Os2ExtendedMetrics>,
    /// Version 5 and later
    pub optical_size: Option<OpticalSizeRange>,
}

impl Os2 {
    /// Decodes an OS/2 table.
    ///
    /// Fails only if the buffer is shorter than [`FIXED_BLOCK_LEN`]; a
    /// trailing block the buffer cannot hold is left out.
    pub fn from_buffer(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BeBufReader::from_buffer(buf);
        reader.peek(FIXED_BLOCK_LEN)?;

        let version = reader.read_u16()?;
        let mut os2 = Self {
            version,
            x_avg_char_width: reader.read_i16()?,
            us_weight_class: reader.read_u16()?,
            us_width_class: reader.read_u16()?,
            fs_type: EmbeddingPermissions::from_bits(reader.read_u16()?),
            y_subscript_x_size: reader.read_i16()?,
            y_subscript_y_size: reader.read_i16()?,
            y_subscript_x_offset: reader.read_i16()?,
            y_subscript_y_offset: reader.read_i16()?,
            y_superscript_x_size: reader.read_i16()?,
            y_superscript_y_size: reader.read_i16()?,
            y_superscript_x_offset: reader.read_i16()?,
            y_superscript_y_offset: reader.read_i16()?,
            y_strikeout_size: reader.read_i16()?,
            y_strikeout_position: reader.read_i16()?,
            s_family_class: reader.read_i16()?,
            panose: reader.read_record()?,
            ul_unicode_range: reader.read_record()?,
            ach_vend_id: reader.read_tag()?,
            fs_selection: SelectionFlags::from_bits(reader.read_u16()?),
            us_first_char_index: reader.read_u16()?,
            us_last_char_index: reader.read_u16()?,
            metrics: None,
            code_page_range: None,
            extended: None,
            optical_size: None,
        };

        // Each block is only looked for when the version defines it and the
        // block before it was found.
        os2.metrics = read_block(&mut reader, version, "typographic metrics");
        if version >= 1 && os2.metrics.is_some() {
            os2.code_page_range = read_block(&mut reader, version, "code page ranges");
        }
        if version >= 2 && os2.code_page_range.is_some() {
            os2.extended = read_block(&mut reader, version, "x-height/cap-height fields");
        }
        if version >= 5 && os2.extended.is_some() {
            os2.optical_size = read_block(&mut reader, version, "optical size range");
        }

        Ok(os2)
    }

    /// The number of bytes the given version defines
    pub fn expected_len(version: u16) -> usize {
        match version {
            0 => 78,
            1 => 86,
            2..=4 => 96,
            _ => 100,
        }
    }

    pub fn weight_class(&self) -> String {
        weight_class_name(self.us_weight_class)
    }

    pub fn width_class(&self) -> &'static str {
        width_class_name(self.us_width_class)
    }

    pub fn is_italic(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::ITALIC)
    }

    pub fn is_underscore(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::UNDERSCORE)
    }

    pub fn is_negative(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::NEGATIVE)
    }

    pub fn is_outlined(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::OUTLINED)
    }

    pub fn is_strikeout(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::STRIKEOUT)
    }

    pub fn is_bold(&self) -> bool {
        self.fs_selection.contains(SelectionFlags::BOLD)
    }

    pub fn style(&self) -> FontStyle {
        FontStyle::from_flags(self.fs_selection)
    }

    /// One of `italic`, `bold`, `underscore`, `outlined`, `strikeout`,
    /// `negative` or `normal`
    pub fn font_style(&self) -> &'static str {
        self.style().as_str()
    }

    pub fn supports_unicode_bit(&self, bit: u8) -> bool {
        bit < 128 && (self.ul_unicode_range[usize::from(bit / 32)] >> (bit % 32)) & 1 == 1
    }

    /// The catalog entries whose bit is set, in catalog order
    pub fn unicode_blocks(&self) -> impl Iterator<Item = &'static UnicodeSupport> + '_ {
        unicode_ranges::supported_blocks(&self.ul_unicode_range)
    }

    /// Every code point range covered by the set bits, formatted as
    /// `U+0400-04FF`, in catalog order
    pub fn unicode_ranges(&self) -> Vec<String> {
        self.unicode_blocks()
            .flat_map(|block| block.ranges.iter().map(ToString::to_string))
            .collect()
    }
}

fn read_block<T: BeRecord>(reader: &mut BeBufReader<'_>, version: u16, block: &str) -> Option<T> {
    if reader.remaining() == 0 && version == 0 {
        debug!("OS/2 version 0 table without {block}");
        return None;
    }

    match reader.read_record() {
        Ok(record) => Some(record),
        Err(err) => {
            warn!("OS/2 version {version} table is missing its {block}: {err}");
            None
        }
    }
}

/// Registry entry point for the 'OS/2' tag
pub fn decode(tag: Tag, buf: &[u8]) -> Result<Table, DecodeError> {
    let os2 = Os2::from_buffer(buf)?;
    Ok(Table::new(tag, buf, TableKind::Os2(os2)))
}
