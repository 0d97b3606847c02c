//! The [Font Variations](https://learn.microsoft.com/en-us/typography/opentype/spec/fvar) table

use std::{cmp::Ordering, ops::Deref};

use log::warn;
use thiserror::Error;

use crate::{
    buffer::{BeBufReader, BeBufReaderError, BeRecord},
    types::{Fixed, NameId, Tag},
};

use super::{DecodeError, Table, TableKind};

/// 'fvar'
pub const TAG: Tag = Tag::new(b"fvar");

pub const HEADER_LEN: usize = 16;

/// The smallest axis record the format has ever defined
pub const AXIS_RECORD_LEN: usize = 20;

/// `subfamilyNameID` and `flags` ahead of the coordinates
const INSTANCE_FIXED_LEN: usize = 4;

/// The header's `countSizePairs` has always been 2
const COUNT_SIZE_PAIRS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FvarHeader {
    pub major_version: u16,
    pub minor_version: u16,
    /// Offset from the start of the table to the axis array
    pub offset_to_data: u16,
    pub count_size_pairs: u16,
    pub axis_count: u16,
    /// Size of each axis record in bytes
    pub axis_size: u16,
    pub instance_count: u16,
    /// Size of each instance record in bytes; decides the instance shape
    pub instance_size: u16,
}

impl BeRecord for FvarHeader {
    const SIZE: usize = HEADER_LEN;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            major_version: reader.read_u16()?,
            minor_version: reader.read_u16()?,
            offset_to_data: reader.read_u16()?,
            count_size_pairs: reader.read_u16()?,
            axis_count: reader.read_u16()?,
            axis_size: reader.read_u16()?,
            instance_count: reader.read_u16()?,
            instance_size: reader.read_u16()?,
        })
    }
}

/// An axis whose min/default/max ordering does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("axis '{tag}' expects min <= default <= max, got {min} / {default} / {max}")]
pub struct AxisRangeError {
    pub tag: Tag,
    pub min: Fixed,
    pub default: Fixed,
    pub max: Fixed,
}

/// One design axis of a variable font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariationAxis {
    pub axis_tag: Tag,
    pub min_value: Fixed,
    pub default_value: Fixed,
    pub max_value: Fixed,
    pub flags: u16,
    pub axis_name_id: NameId,
}

impl VariationAxis {
    /// Flag bit 0: the axis should not be exposed in user interfaces.
    pub const HIDDEN_AXIS: u16 = 0x0001;

    pub fn is_hidden(&self) -> bool {
        self.flags & Self::HIDDEN_AXIS != 0
    }

    /// Checks min <= default <= max.
    ///
    /// Decoding never enforces this; it is up to the caller.
    pub fn validate(&self) -> Result<(), AxisRangeError> {
        if self.min_value <= self.default_value && self.default_value <= self.max_value {
            return Ok(());
        }

        Err(AxisRangeError {
            tag: self.axis_tag,
            min: self.min_value,
            default: self.default_value,
            max: self.max_value,
        })
    }

    /// Maps a user-space coordinate onto -1..=1, the default value landing on 0.
    pub fn normalize(&self, value: Fixed) -> Fixed {
        let min_value = self.min_value;
        let default_value = self.default_value;
        // clamp would panic with max < min
        let max_value = self.max_value.max(min_value);
        let value = value.clamp(min_value, max_value);

        let normalized = match value.cmp(&default_value) {
            Ordering::Less => -(default_value
                .saturating_sub(value)
                .saturating_div(default_value.saturating_sub(min_value))),
            Ordering::Greater => value
                .saturating_sub(default_value)
                .saturating_div(max_value.saturating_sub(default_value)),
            Ordering::Equal => Fixed::ZERO,
        };
        normalized.clamp(-Fixed::ONE, Fixed::ONE)
    }
}

impl BeRecord for VariationAxis {
    const SIZE: usize = AXIS_RECORD_LEN;

    fn read_from(reader: &mut BeBufReader<'_>) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            axis_tag: reader.read_tag()?,
            min_value: reader.read_fixed()?,
            default_value: reader.read_fixed()?,
            max_value: reader.read_fixed()?,
            flags: reader.read_u16()?,
            axis_name_id: reader.read_name_id()?,
        })
    }
}

/// Whether the instance records of a table end with a `postScriptNameID`.
///
/// This is decided once per table, from the header's `instanceSize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceShape {
    WithoutPostScriptName,
    WithPostScriptName,
}

impl InstanceShape {
    /// The size in bytes of a record of this shape
    pub fn record_len(self, axis_count: u16) -> usize {
        let len = INSTANCE_FIXED_LEN + usize::from(axis_count) * Fixed::SIZE;
        match self {
            InstanceShape::WithoutPostScriptName => len,
            InstanceShape::WithPostScriptName => len + NameId::SIZE,
        }
    }

    /// Picks the shape whose size matches the header's `instanceSize`
    pub fn resolve(header: &FvarHeader) -> Result<Self, DecodeError> {
        let declared = usize::from(header.instance_size);
        let without = Self::WithoutPostScriptName.record_len(header.axis_count);
        let with = Self::WithPostScriptName.record_len(header.axis_count);

        if declared == without {
            Ok(Self::WithoutPostScriptName)
        } else if declared == with {
            Ok(Self::WithPostScriptName)
        } else {
            Err(DecodeError::Malformed(format!(
                "instance size {declared} matches neither {without} nor {with} bytes for {} axes",
                header.axis_count
            )))
        }
    }
}

/// A named position in the design space
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Instance {
    pub subfamily_name_id: NameId,
    pub flags: u16,
    /// One coordinate per axis, in axis order
    pub coordinates: Vec<Fixed>,
}

impl Instance {
    fn read(reader: &mut BeBufReader<'_>, axis_count: u16) -> Result<Self, BeBufReaderError> {
        Ok(Self {
            subfamily_name_id: reader.read_name_id()?,
            flags: reader.read_u16()?,
            coordinates: reader.read_records(usize::from(axis_count))?,
        })
    }
}

/// An instance record carrying a PostScript name
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NamedInstance {
    pub instance: Instance,
    pub post_script_name_id: NameId,
}

/// All instance records of a table; every record has the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum InstanceRecords {
    WithoutPostScriptName(Vec<Instance>),
    WithPostScriptName(Vec<NamedInstance>),
}

impl InstanceRecords {
    pub fn shape(&self) -> InstanceShape {
        match self {
            InstanceRecords::WithoutPostScriptName(_) => InstanceShape::WithoutPostScriptName,
            InstanceRecords::WithPostScriptName(_) => InstanceShape::WithPostScriptName,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            InstanceRecords::WithoutPostScriptName(records) => records.len(),
            InstanceRecords::WithPostScriptName(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<InstanceRef<'_>> {
        match self {
            InstanceRecords::WithoutPostScriptName(records) => {
                records.get(index).map(|instance| InstanceRef {
                    instance,
                    post_script_name_id: None,
                })
            }
            InstanceRecords::WithPostScriptName(records) => {
                records.get(index).map(|named| InstanceRef {
                    instance: &named.instance,
                    post_script_name_id: Some(named.post_script_name_id),
                })
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = InstanceRef<'_>> {
        (0..self.len()).filter_map(move |index| self.get(index))
    }
}

/// A borrowed view over one instance, whichever the table's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceRef<'a> {
    pub instance: &'a Instance,
    pub post_script_name_id: Option<NameId>,
}

impl Deref for InstanceRef<'_> {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        self.instance
    }
}

/// A decoded fvar table
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fvar {
    pub header: FvarHeader,
    pub axes: Vec<VariationAxis>,
    pub instances: InstanceRecords,
    consumed_len: usize,
}

impl Fvar {
    /// Decodes an fvar table.
    ///
    /// Axis and instance records are stepped through using the sizes the
    /// header declares, so records grown by later minor versions are read
    /// correctly and their extra bytes skipped.
    pub fn from_buffer(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BeBufReader::from_buffer(buf);
        let header: FvarHeader = reader.read_record()?;

        if header.count_size_pairs != COUNT_SIZE_PAIRS {
            warn!(
                "fvar countSizePairs is {}, expected {COUNT_SIZE_PAIRS}",
                header.count_size_pairs
            );
        }

        let data_offset = usize::from(header.offset_to_data);
        if data_offset < HEADER_LEN {
            return Err(DecodeError::Malformed(format!(
                "axis array offset {data_offset} points inside the {HEADER_LEN}-byte header"
            )));
        }

        let axis_size = usize::from(header.axis_size);
        if axis_size < AXIS_RECORD_LEN {
            return Err(DecodeError::Malformed(format!(
                "axis size {axis_size} is smaller than the {AXIS_RECORD_LEN}-byte axis record"
            )));
        }

        let instance_shape = InstanceShape::resolve(&header)?;

        reader.seek_to(data_offset)?;

        let mut axes: Vec<VariationAxis> = Vec::with_capacity(usize::from(header.axis_count));
        for _ in 0..header.axis_count {
            let mut record = reader.sub_reader(axis_size)?;
            axes.push(record.read_record()?);
        }

        let instance_size = usize::from(header.instance_size);
        let instances = match instance_shape {
            InstanceShape::WithoutPostScriptName => {
                let mut records = Vec::with_capacity(usize::from(header.instance_count));
                for _ in 0..header.instance_count {
                    let mut record = reader.sub_reader(instance_size)?;
                    records.push(Instance::read(&mut record, header.axis_count)?);
                }
                InstanceRecords::WithoutPostScriptName(records)
            }
            InstanceShape::WithPostScriptName => {
                let mut records = Vec::with_capacity(usize::from(header.instance_count));
                for _ in 0..header.instance_count {
                    let mut record = reader.sub_reader(instance_size)?;
                    records.push(NamedInstance {
                        instance: Instance::read(&mut record, header.axis_count)?,
                        post_script_name_id: record.read_name_id()?,
                    });
                }
                InstanceRecords::WithPostScriptName(records)
            }
        };

        Ok(Self {
            header,
            axes,
            instances,
            consumed_len: reader.position(),
        })
    }

    /// The number of bytes spanned by the header and the records
    pub fn consumed_len(&self) -> usize {
        self.consumed_len
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn instance_shape(&self) -> InstanceShape {
        self.instances.shape()
    }

    /// The first axis with the given tag
    pub fn axis(&self, tag: Tag) -> Option<&VariationAxis> {
        self.axes.iter().find(|axis| axis.axis_tag == tag)
    }
}

/// Registry entry point for the 'fvar' tag
pub fn decode(tag: Tag, buf: &[u8]) -> Result<Table, DecodeError> {
    let fvar = Fvar::from_buffer(buf)?;
    Ok(Table::new(tag, buf, TableKind::Fvar(fvar)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tables::TableRegistry, test_helpers::BeBuffer};
    use pretty_assertions::assert_eq;

    const WGHT: Tag = Tag::new(b"wght");
    const WDTH: Tag = Tag::new(b"wdth");

    fn header(axis_count: u16, axis_size: u16, instance_count: u16, instance_size: u16) -> BeBuffer {
        BeBuffer::new()
            .push(1u16)
            .push(0u16)
            .push(16u16)
            .push(2u16)
            .push(axis_count)
            .push(axis_size)
            .push(instance_count)
            .push(instance_size)
    }

    fn push_axis(buf: BeBuffer, tag: Tag, min: f64, default: f64, max: f64, name: u16) -> BeBuffer {
        buf.push(tag)
            .push(Fixed::from_f64(min))
            .push(Fixed::from_f64(default))
            .push(Fixed::from_f64(max))
            .push(0u16)
            .push(NameId::new(name))
    }

    fn two_axes(instance_count: u16, instance_size: u16) -> BeBuffer {
        let buf = header(2, 20, instance_count, instance_size);
        let buf = push_axis(buf, WGHT, 100.0, 400.0, 900.0, 256);
        push_axis(buf, WDTH, 75.0, 100.0, 125.0, 257)
    }

    #[test]
    fn instances_without_post_script_name() {
        let data = two_axes(1, 12)
            .push(NameId::new(258))
            .push(0u16)
            .push(Fixed::from_f64(700.0))
            .push(Fixed::from_f64(87.5));

        let fvar = Fvar::from_buffer(&data).unwrap();
        assert_eq!(fvar.axis_count(), 2);
        assert_eq!(fvar.instance_shape(), InstanceShape::WithoutPostScriptName);
        assert_eq!(fvar.consumed_len(), 16 + 2 * 20 + 12);

        let wght = fvar.axis(WGHT).unwrap();
        assert_eq!(wght.min_value, Fixed::from_f64(100.0));
        assert_eq!(wght.default_value, Fixed::from_f64(400.0));
        assert_eq!(wght.max_value, Fixed::from_f64(900.0));
        assert_eq!(wght.axis_name_id, NameId::new(256));
        assert_eq!(fvar.axes[1].axis_tag, WDTH);

        let instance = fvar.instances.get(0).unwrap();
        assert_eq!(instance.subfamily_name_id, NameId::new(258));
        assert_eq!(
            instance.coordinates,
            vec![Fixed::from_f64(700.0), Fixed::from_f64(87.5)]
        );
        assert_eq!(instance.post_script_name_id, None);
    }

    #[test]
    fn instances_with_post_script_name() {
        let mut data = two_axes(3, 14);
        for i in 0..3u16 {
            data = data
                .push(NameId::new(258 + i))
                .push(0u16)
                .push(Fixed::from_f64(100.0 * f64::from(i + 1)))
                .push(Fixed::from_f64(100.0))
                .push(NameId::new(300 + i));
        }

        let fvar = Fvar::from_buffer(&data).unwrap();
        assert_eq!(fvar.instance_shape(), InstanceShape::WithPostScriptName);
        assert_eq!(fvar.instances.len(), 3);
        assert_eq!(fvar.consumed_len(), 16 + 2 * 20 + 3 * 14);
        for (i, instance) in fvar.instances.iter().enumerate() {
            assert_eq!(instance.post_script_name_id, Some(NameId::new(300 + i as u16)));
            assert_eq!(instance.coordinates.len(), 2);
        }
    }

    #[test]
    fn instance_size_must_match_a_shape() {
        let data = two_axes(1, 13).zeros(13);
        let err = Fvar::from_buffer(&data).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn instance_size_is_checked_without_instances() {
        let data = two_axes(0, 12);
        let fvar = Fvar::from_buffer(&data).unwrap();
        assert!(fvar.instances.is_empty());
        assert_eq!(fvar.consumed_len(), 56);

        let buf = header(1, 20, 0, 3);
        let data = push_axis(buf, WGHT, 100.0, 400.0, 900.0, 256);
        assert!(matches!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            Fvar::from_buffer(&two_axes(0, 0)),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn data_offset_past_the_end_is_truncated() {
        let data = BeBuffer::new().extend([1u16, 0, 64, 2, 0, 20, 0, 4]);
        assert_eq!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Truncated(BeBufReaderError::FailedToSeek {
                pos: 64,
                len: 16
            }))
        );
    }

    #[test]
    fn larger_axis_records_are_stepped_over() {
        let buf = header(1, 24, 1, 8);
        let data = push_axis(buf, WGHT, 100.0, 400.0, 900.0, 256)
            .push(0xFFFF_FFFFu32) // unknown trailing field
            .push(NameId::new(257))
            .push(0u16)
            .push(Fixed::from_f64(500.0));

        let fvar = Fvar::from_buffer(&data).unwrap();
        assert_eq!(fvar.axes[0].axis_tag, WGHT);
        assert_eq!(
            fvar.instances.get(0).unwrap().coordinates,
            vec![Fixed::from_f64(500.0)]
        );
        assert_eq!(fvar.consumed_len(), 16 + 24 + 8);
    }

    #[test]
    fn axis_size_below_minimum_is_malformed() {
        let data = header(1, 18, 0, 8).zeros(18);
        assert!(matches!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn offset_inside_header_is_malformed() {
        let data = BeBuffer::new()
            .extend([1u16, 0, 8, 2, 0, 20, 0, 4]);
        assert!(matches!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_records() {
        assert!(matches!(
            Fvar::from_buffer(&[0; 15]),
            Err(DecodeError::Truncated(_))
        ));

        let data = two_axes(1, 12).push(NameId::new(258)).push(0u16);
        assert!(matches!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Truncated(_))
        ));

        let data = header(2, 20, 0, 12);
        let data = push_axis(data, WGHT, 100.0, 400.0, 900.0, 256);
        assert!(matches!(
            Fvar::from_buffer(&data),
            Err(DecodeError::Truncated(_))
        ));
    }

    #[test]
    fn axis_ranges_are_not_checked_while_decoding() {
        let buf = header(1, 20, 0, 8);
        let data = push_axis(buf, WGHT, 900.0, 400.0, 100.0, 256);

        let fvar = Fvar::from_buffer(&data).unwrap();
        let err = fvar.axes[0].validate().unwrap_err();
        assert_eq!(err.tag, WGHT);
        assert_eq!(err.min, Fixed::from_f64(900.0));

        let fvar = Fvar::from_buffer(&two_axes(0, 12)).unwrap();
        assert!(fvar.axes.iter().all(|axis| axis.validate().is_ok()));
    }

    #[test]
    fn normalize() {
        let fvar = Fvar::from_buffer(&two_axes(0, 12)).unwrap();
        let wght = fvar.axis(WGHT).unwrap();
        let values = [0.0, 100.0, 250.0, 400.0, 650.0, 900.0, 1000.0];
        let expected = [-1.0, -1.0, -0.5, 0.0, 0.5, 1.0, 1.0];
        for (value, expected) in values.into_iter().zip(expected) {
            assert_eq!(
                wght.normalize(Fixed::from_f64(value)),
                Fixed::from_f64(expected),
                "{value}"
            );
        }
    }

    #[test]
    fn hidden_axis_flag() {
        let data = header(1, 20, 0, 8)
            .push(Tag::new(b"opsz"))
            .extend([Fixed::from_f64(8.0), Fixed::from_f64(12.0), Fixed::from_f64(72.0)])
            .push(VariationAxis::HIDDEN_AXIS)
            .push(NameId::new(256));
        let fvar = Fvar::from_buffer(&data).unwrap();
        assert!(fvar.axes[0].is_hidden());
    }

    #[test]
    fn decoded_through_registry() {
        let data = two_axes(0, 12);
        let table = TableRegistry::default().decode(TAG, &data).unwrap();
        let fvar = table.as_fvar().unwrap();
        assert_eq!(fvar.header.major_version, 1);
        assert_eq!(table.bytes(), &*data);

        let err = TableRegistry::default()
            .decode(TAG, &two_axes(1, 13).zeros(13))
            .unwrap_err();
        assert_eq!(err.tag, TAG);
    }
}
