use std::{
    any::Any,
    collections::{BTreeMap, btree_map::Keys},
    fmt::Debug,
    iter::Copied,
};

use log::debug;
use thiserror::Error;

use crate::{buffer::BeBufReaderError, types::Tag};

pub mod fvar;
pub mod os2;
pub mod unicode_ranges;

use fvar::Fvar;
use os2::Os2;

/// Represents the error messages which may occur when trying
/// to decode a table from its raw binary buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before a required fixed-size read.
    #[error("Truncated table data: {0}")]
    Truncated(#[from] BeBufReaderError),

    /// A size or count declared inside the table contradicts its layout.
    #[error("Malformed table: {0}")]
    Malformed(String),
}

/// A decode failure, tagged with the table that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode the '{tag}' table: {source}")]
pub struct TableDecodeError {
    pub tag: Tag,
    #[source]
    pub source: DecodeError,
}

/// A decoded table supplied by a decoder living outside this crate.
///
/// Implementors only need to hand out `self` as `Any`, which lets callers
/// downcast through [`Table::downcast_ref`].
pub trait FontTable: Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// The decoded contents of a table
#[derive(Debug)]
pub enum TableKind {
    Os2(Os2),
    Fvar(Fvar),
    Other(Box<dyn FontTable>),
    /// No decoder is registered for the tag; only the raw bytes are kept.
    Unparsed,
}

/// A single font table: its tag, its original bytes and whatever was decoded from them.
///
/// Tables are immutable once built.
#[derive(Debug)]
pub struct Table {
    tag: Tag,
    bytes: Vec<u8>,
    kind: TableKind,
}

impl Table {
    pub fn new(tag: Tag, bytes: &[u8], kind: TableKind) -> Self {
        Self {
            tag,
            bytes: bytes.to_vec(),
            kind,
        }
    }

    pub fn unparsed(tag: Tag, bytes: &[u8]) -> Self {
        Self::new(tag, bytes, TableKind::Unparsed)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The table's bytes exactly as they were handed to the decoder
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> &TableKind {
        &self.kind
    }

    pub fn is_parsed(&self) -> bool {
        !matches!(self.kind, TableKind::Unparsed)
    }

    pub fn as_os2(&self) -> Option<&Os2> {
        match &self.kind {
            TableKind::Os2(os2) => Some(os2),
            _ => None,
        }
    }

    pub fn as_fvar(&self) -> Option<&Fvar> {
        match &self.kind {
            TableKind::Fvar(fvar) => Some(fvar),
            _ => None,
        }
    }

    /// Returns the externally decoded table if it is a `T`
    pub fn downcast_ref<T: FontTable>(&self) -> Option<&T> {
        match &self.kind {
            TableKind::Other(table) => table.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// A function decoding the bytes of the table identified by the tag.
pub type DecodeFn = fn(Tag, &[u8]) -> Result<Table, DecodeError>;

/// Maps table tags to the decoder in charge of them.
///
/// `TableRegistry::default()` knows the 'OS/2' and 'fvar' tables; any other
/// decoder can be plugged in with [`TableRegistry::register`]. Once built the
/// registry is only read, so one instance can be shared between threads.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    decoders: BTreeMap<Tag, DecodeFn>,
}

impl TableRegistry {
    /// Returns a registry with no decoder at all
    pub fn new() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Maps `tag` to `decoder`, returning the decoder it replaces if any
    pub fn register(&mut self, tag: Tag, decoder: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(tag, decoder)
    }

    pub fn unregister(&mut self, tag: Tag) -> Option<DecodeFn> {
        self.decoders.remove(&tag)
    }

    pub fn is_registered(&self, tag: Tag) -> bool {
        self.decoders.contains_key(&tag)
    }

    /// The registered tags, in byte order
    pub fn tags(&self) -> Copied<Keys<'_, Tag, DecodeFn>> {
        self.decoders.keys().copied()
    }

    /// Decodes one table.
    ///
    /// A tag without a registered decoder is not an error: the table comes
    /// back unparsed, with its bytes retained.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfnt_decode::{tables::TableRegistry, types::Tag};
    ///
    /// let registry = TableRegistry::default();
    /// let table = registry.decode(Tag::new(b"glyf"), &[1, 2, 3]).unwrap();
    ///
    /// assert!(!table.is_parsed());
    /// assert_eq!(table.bytes(), &[1, 2, 3]);
    /// ```
    pub fn decode(&self, tag: Tag, bytes: &[u8]) -> Result<Table, TableDecodeError> {
        let Some(decoder) = self.decoders.get(&tag) else {
            debug!("no decoder registered for '{tag}', keeping {} raw bytes", bytes.len());
            return Ok(Table::unparsed(tag, bytes));
        };

        debug!("decoding '{tag}' ({} bytes)", bytes.len());
        decoder(tag, bytes).map_err(|source| TableDecodeError { tag, source })
    }

    /// Decodes every `(tag, bytes)` pair independently.
    ///
    /// The results keep the input order; a failing table never stops the
    /// ones after it from being decoded.
    pub fn decode_all<'a, I>(&self, tables: I) -> Vec<Result<Table, TableDecodeError>>
    where
        I: IntoIterator<Item = (Tag, &'a [u8])>,
    {
        tables
            .into_iter()
            .map(|(tag, bytes)| self.decode(tag, bytes))
            .collect()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(os2::TAG, os2::decode);
        registry.register(fvar::TAG, fvar::decode);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{buffer::BeBufReader, test_helpers::BeBuffer};
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Maxp {
        num_glyphs: u16,
    }

    impl FontTable for Maxp {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn decode_maxp(tag: Tag, buf: &[u8]) -> Result<Table, DecodeError> {
        let mut reader = BeBufReader::from_buffer(buf);
        reader.skip(4)?;
        let num_glyphs = reader.read_u16()?;
        Ok(Table::new(
            tag,
            buf,
            TableKind::Other(Box::new(Maxp { num_glyphs })),
        ))
    }

    fn fail(_: Tag, _: &[u8]) -> Result<Table, DecodeError> {
        Err(DecodeError::Malformed("always".into()))
    }

    #[test]
    fn default_registry_knows_os2_and_fvar() {
        let registry = TableRegistry::default();
        assert_eq!(
            registry.tags().collect::<Vec<_>>(),
            vec![Tag::new(b"OS/2"), Tag::new(b"fvar")]
        );
        assert!(!TableRegistry::new().is_registered(Tag::new(b"OS/2")));
    }

    #[test]
    fn unknown_tag_is_unparsed() {
        let registry = TableRegistry::new();
        let table = registry.decode(Tag::new(b"OS/2"), &[0; 100]).unwrap();
        assert_eq!(table.tag(), Tag::new(b"OS/2"));
        assert!(!table.is_parsed());
        assert!(table.as_os2().is_none());
        assert_eq!(table.bytes().len(), 100);
    }

    #[test]
    fn custom_decoder_can_be_registered() {
        let mut registry = TableRegistry::default();
        let maxp = Tag::new(b"maxp");
        assert!(registry.register(maxp, decode_maxp).is_none());

        let data = BeBuffer::new().push(0x0000_5000u32).push(42u16);
        let table = registry.decode(maxp, &data).unwrap();
        assert_eq!(table.downcast_ref::<Maxp>(), Some(&Maxp { num_glyphs: 42 }));
        assert_eq!(table.bytes(), &*data);

        assert!(registry.unregister(maxp).is_some());
        assert!(!registry.decode(maxp, &data).unwrap().is_parsed());
    }

    #[test]
    fn failures_are_reported_per_table() {
        let mut registry = TableRegistry::default();
        registry.register(Tag::new(b"fail"), fail);
        let short = [0u8; 10];
        let maxp = [0u8; 6];

        let results = registry.decode_all([
            (Tag::new(b"fail"), &maxp[..]),
            (Tag::new(b"OS/2"), &short[..]),
            (Tag::new(b"maxp"), &maxp[..]),
        ]);

        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap_err();
        assert_eq!(first.tag, Tag::new(b"fail"));
        assert_eq!(first.source, DecodeError::Malformed("always".into()));

        let second = results[1].as_ref().unwrap_err();
        assert_eq!(second.tag, Tag::new(b"OS/2"));
        assert!(matches!(second.source, DecodeError::Truncated(_)));

        assert!(results[2].is_ok());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn registry_and_tables_are_shared_across_threads() {
        assert_send_sync::<TableRegistry>();
        assert_send_sync::<Table>();
        assert_send_sync::<TableKind>();
        assert_send_sync::<TableDecodeError>();

        let registry = TableRegistry::default();
        let glyf = Table::unparsed(Tag::new(b"glyf"), &[1, 2, 3]);
        let short = [0u8; 10];

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        assert_eq!(glyf.bytes(), &[1, 2, 3]);
                        registry.decode(os2::TAG, &short[..]).unwrap_err().tag
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), os2::TAG);
            }
        });
    }
}
