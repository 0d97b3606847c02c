//! A short description of a font built from its decoded tables

use log::debug;

use crate::{
    SfntError,
    tables::{Table, TableRegistry},
    types::Tag,
};

const WGHT: Tag = Tag::new(b"wght");

/// Weight, width, style and Unicode coverage of a font.
///
/// Fields stay `None` when the tables they come from are missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontSummary {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub font_style: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub font_weight: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub font_width: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub unicode_range: Option<Vec<String>>,
}

impl FontSummary {
    /// Collects the summary from whichever tables are present.
    ///
    /// The weight is first taken from the default of the 'wght' axis, then
    /// replaced by the OS/2 weight class if the font has an OS/2 table.
    pub fn from_tables<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Self {
        let tables: Vec<&Table> = tables.into_iter().collect();
        let mut summary = Self::default();

        if let Some(fvar) = tables.iter().find_map(|table| table.as_fvar()) {
            if let Some(axis) = fvar.axis(WGHT) {
                summary.font_weight = Some(axis.default_value.integer_part().to_string());
            } else {
                debug!("fvar table has no 'wght' axis");
            }
        }

        if let Some(os2) = tables.iter().find_map(|table| table.as_os2()) {
            summary.font_weight = Some(os2.weight_class());
            summary.font_width = Some(os2.width_class().to_string());
            summary.font_style = Some(os2.font_style().to_string());
            summary.unicode_range = Some(os2.unicode_ranges());
        }

        summary
    }

    /// Decodes the given tables and summarizes them, stopping at the first
    /// table that fails to decode.
    pub fn decode<'a>(
        registry: &TableRegistry,
        tables: impl IntoIterator<Item = (Tag, &'a [u8])>,
    ) -> Result<Self, SfntError> {
        let decoded = registry
            .decode_all(tables)
            .into_iter()
            .collect::<Result<Vec<Table>, _>>()?;

        Ok(Self::from_tables(&decoded))
    }

    /// Renders the summary as an indented JSON object, leaving absent fields out
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, SfntError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
