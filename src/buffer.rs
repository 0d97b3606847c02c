use thiserror::Error;

use crate::types::{Fixed, NameId, Tag};

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, BeBufReaderError> {
            let bytes = self.read_exact(size_of::<$typ>())?;
            let mut raw = [0u8; size_of::<$typ>()];
            raw.copy_from_slice(bytes);

            Ok(<$typ>::from_be_bytes(raw))
        }
    };
}

/// Represents the possible errors that can occur when using `BeBufReader`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeBufReaderError {
    /// A read needed more bytes than remain after the cursor.
    #[error("Truncated read at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A seek targeted a position past the end of the buffer.
    #[error("Failed to seek to {pos}, buffer is only {len} bytes long")]
    FailedToSeek { pos: usize, len: usize },
}

/// A fixed-size record which can be decoded field by field, in declaration
/// order, from a big-endian buffer.
///
/// `SIZE` is the exact number of bytes the record occupies on the wire;
/// there is never any padding between fields.
pub trait BeRecord: Sized {
    const SIZE: usize;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError>;
}

/// A cursor over a borrowed byte buffer reading network-order values.
///
/// A failed read never moves the cursor.
#[derive(Debug, Clone)]
pub struct BeBufReader<'a> {
    inner: &'a [u8],
    pos: usize,
}

impl<'a> BeBufReader<'a> {
    /// Returns a new reader positioned at the start of `buffer`
    ///
    /// # Examples
    ///
    /// ```
    /// use sfnt_decode::buffer::BeBufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = BeBufReader::from_buffer(&data);
    ///
    /// assert_eq!(reader.read_u32().unwrap(), 10);
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// assert!(reader.read_u8().is_err());
    /// ```
    pub fn from_buffer(buffer: &'a [u8]) -> Self {
        Self {
            inner: buffer,
            pos: 0,
        }
    }

    /// The current cursor position, in bytes from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.inner.len() - self.pos
    }

    /// Seeks to a specific place in the buffer, counted from its start
    ///
    /// # Examples
    ///
    /// ```
    /// use sfnt_decode::buffer::BeBufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = BeBufReader::from_buffer(&data);
    ///
    /// reader.seek_to(4).unwrap();
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// assert!(reader.seek_to(9).is_err());
    /// ```
    pub fn seek_to(&mut self, pos: usize) -> Result<(), BeBufReaderError> {
        if pos > self.inner.len() {
            return Err(BeBufReaderError::FailedToSeek {
                pos,
                len: self.inner.len(),
            });
        }

        self.pos = pos;
        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor position
    pub fn skip(&mut self, n: usize) -> Result<(), BeBufReaderError> {
        self.read_exact(n).map(|_| ())
    }

    /// Borrows the next `n` bytes and advances past them
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], BeBufReaderError> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    /// Borrows the next `n` bytes without moving the cursor
    pub fn peek(&self, n: usize) -> Result<&'a [u8], BeBufReaderError> {
        let available = self.remaining();
        if n > available {
            return Err(BeBufReaderError::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }

        Ok(&self.inner[self.pos..self.pos + n])
    }

    /// Reads a fixed-size record.
    ///
    /// The whole record must be available before any of its fields is read,
    /// so a short buffer leaves the cursor where it was.
    pub fn read_record<T: BeRecord>(&mut self) -> Result<T, BeBufReaderError> {
        let bytes = self.peek(T::SIZE)?;
        let mut record_reader = BeBufReader::from_buffer(bytes);
        let record = T::read_from(&mut record_reader)?;
        self.pos += T::SIZE;

        Ok(record)
    }

    /// Reads `count` consecutive records of the same type
    pub fn read_records<T: BeRecord>(&mut self, count: usize) -> Result<Vec<T>, BeBufReaderError> {
        let total = T::SIZE.saturating_mul(count);
        self.peek(total)?;

        (0..count).map(|_| self.read_record()).collect()
    }

    /// Splits off a reader over the next `len` bytes, advancing this reader past them
    pub fn sub_reader(&mut self, len: usize) -> Result<BeBufReader<'a>, BeBufReaderError> {
        self.read_exact(len).map(BeBufReader::from_buffer)
    }

    impl_read!(read_i32, i32);
    impl_read!(read_u32, u32);
    impl_read!(read_i16, i16);
    impl_read!(read_u16, u16);
    impl_read!(read_i8, i8);
    impl_read!(read_u8, u8);

    pub fn read_tag(&mut self) -> Result<Tag, BeBufReaderError> {
        self.read_record()
    }

    pub fn read_fixed(&mut self) -> Result<Fixed, BeBufReaderError> {
        self.read_record()
    }

    pub fn read_name_id(&mut self) -> Result<NameId, BeBufReaderError> {
        self.read_record()
    }
}

macro_rules! impl_record_for_int {
    ($($typ:ty => $fn_name:ident),* $(,)?) => {
        $(
            impl BeRecord for $typ {
                const SIZE: usize = size_of::<$typ>();

                fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
                    reader.$fn_name()
                }
            }
        )*
    };
}

impl_record_for_int!(
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
);

impl<T: BeRecord + Copy + Default, const N: usize> BeRecord for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = reader.read_record()?;
        }
        Ok(out)
    }
}
