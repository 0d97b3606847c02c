//! small utilities used in tests

use crate::types::{Fixed, NameId, Tag};

/// A value with a big-endian wire representation.
pub trait Scalar {
    fn write_be(&self, out: &mut Vec<u8>);
}

macro_rules! impl_scalar {
    ($($typ:ty),*) => {
        $(
            impl Scalar for $typ {
                fn write_be(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32);

impl Scalar for Tag {
    fn write_be(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}

impl Scalar for Fixed {
    fn write_be(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bits().to_be_bytes());
    }
}

impl Scalar for NameId {
    fn write_be(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_u16().to_be_bytes());
    }
}

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        item.write_be(&mut self.data);
        self
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            item.write_be(&mut self.data);
        }
        self
    }

    /// Append `n` zero bytes
    pub fn zeros(mut self, n: usize) -> Self {
        self.data.resize(self.data.len() + n, 0);
        self
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
