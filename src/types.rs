//! Scalar types shared by the table decoders

use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use thiserror::Error;

use crate::buffer::{BeBufReader, BeBufReaderError, BeRecord};

/// A 4-byte table or axis identifier.
///
/// Tags found in fonts are not validated; any four bytes are representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const fn new(src: &[u8; 4]) -> Self {
        Self(*src)
    }

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn from_u32(src: u32) -> Self {
        Self::from_be_bytes(src.to_be_bytes())
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

/// The tag could not be built from the given string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTag {
    #[error("a tag must be between 1 and 4 bytes long, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Tag {
    type Err = InvalidTag;

    /// Shorter strings are padded with spaces, as in `"cvt "`.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let bytes = src.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(InvalidTag::InvalidLength(bytes.len()));
        }

        let mut raw = [b' '; 4];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", self.to_string())
    }
}

impl BeRecord for Tag {
    const SIZE: usize = 4;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        let bytes = reader.read_exact(Self::SIZE)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(Self(raw))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Tag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A signed 16.16 fixed-point number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << 16);
    pub const MIN: Self = Self(i32::MIN);
    pub const MAX: Self = Self(i32::MAX);

    const FRACT_BITS: u32 = 16;

    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// The high 16 bits, i.e. the integer part rounded toward negative infinity
    pub const fn integer_part(self) -> i16 {
        (self.0 >> Self::FRACT_BITS) as i16
    }

    /// The low 16 bits
    pub const fn fract_bits(self) -> u16 {
        self.0 as u16
    }

    /// Converts from a float, rounding to the nearest representable value
    /// and saturating at the bounds.
    pub fn from_f64(value: f64) -> Self {
        Self((value * 65536.0).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }

    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Fixed-point division, rounding to nearest. Division by zero saturates.
    pub fn saturating_div(self, other: Self) -> Self {
        if other.0 == 0 {
            return if self.0 < 0 { Self::MIN } else { Self::MAX };
        }
        let negative = (self.0 < 0) != (other.0 < 0);
        let num = (self.0 as i64).abs() << Self::FRACT_BITS;
        let den = (other.0 as i64).abs();
        let quotient = (num + den / 2) / den;
        let quotient = if negative { -quotient } else { quotient };
        Self(quotient.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }
}

impl std::ops::Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

impl Debug for Fixed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

impl BeRecord for Fixed {
    const SIZE: usize = 4;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        reader.read_i32().map(Self)
    }
}

/// A reference to an entry of the 'name' table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(transparent)]
pub struct NameId(u16);

impl NameId {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl Display for NameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for NameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NameId({})", self.0)
    }
}

impl BeRecord for NameId {
    const SIZE: usize = 2;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        reader.read_u16().map(Self)
    }
}
