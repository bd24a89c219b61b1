//! Trained feature schema shared by the encoder and the model loader.
//!
//! Every table in this module was snapshotted from the training run that produced the
//! deployed model. Changing any of them without retraining produces silently wrong
//! predictions, so they only move together with `SCHEMA_VERSION`.

use chrono::Weekday;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// Bumped whenever a column, ordinal, or vocabulary entry changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const MONTH: &str = "Month";
pub const IS_WEEKEND: &str = "Is_Weekend";
pub const SIZE_ENCODED: &str = "Size_Encoded";
pub const STOCK: &str = "Stock";
pub const RATE: &str = "RATE";

pub const CATEGORY_PREFIX: &str = "Category_";

/// Ordinal assigned to any size outside the table. Matches `Unknown` and `S`.
pub const UNKNOWN_SIZE_ORDINAL: u8 = 2;

const BASE_COLUMNS: [&str; 5] = [MONTH, IS_WEEKEND, SIZE_ENCODED, STOCK, RATE];

// Case variants (`BTM`/`btm`, `SET`/`sEt`/`set`, ...) are distinct columns in the fitted model.
const CATEGORY_VOCABULARY: &[&str] = &[
    "BL0", "BL1", "BTM", "CH2", "CMB", "J00", "J01", "J02", "J03", "J04", "JAN", "JNE", "LAB",
    "MEN", "NW0", "PJ0", "PJN", "PSE", "SAR", "SET", "SHI", "TAG", "btm", "jne", "pJN", "sEt",
    "set",
];

const SIZE_ORDINALS: &[(&str, u8)] = &[
    ("Free", 0),
    ("XS", 1),
    ("S", 2),
    ("M", 3),
    ("L", 4),
    ("XL", 5),
    ("XXL", 6),
    ("3XL", 7),
    ("Unknown", UNKNOWN_SIZE_ORDINAL),
];

const WEEKEND_DAYS: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

/// Category codes offered by the input form. Not all of them are in the trained vocabulary.
pub const CATEGORY_CHOICES: &[&str] = &[
    "TAG", "JNE", "SET", "KUR", "TP ", "BTM", "Western", "Ethnic", "Other",
];

/// Size choices offered by the input form, smallest first.
pub const SIZE_CHOICES: &[&str] = &["Free", "XS", "S", "M", "L", "XL", "XXL", "3XL"];

static TRAINED_SCHEMA: OnceLock<FeatureSchema> = OnceLock::new();

/// Ordered column layout and encoding tables the model was fitted against.
#[derive(Debug)]
pub struct FeatureSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    categories: Range<usize>,
    size_ordinals: HashMap<&'static str, u8>,
}

impl FeatureSchema {
    /// Process-wide schema, built on first use and never mutated afterwards.
    pub fn trained() -> &'static FeatureSchema {
        TRAINED_SCHEMA.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|name| name.to_string()).collect();
        let first_category = columns.len();
        columns.extend(CATEGORY_VOCABULARY.iter().map(|code| category_column(code)));

        let positions = columns
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();

        Self {
            categories: first_category..columns.len(),
            columns,
            positions,
            size_ordinals: SIZE_ORDINALS.iter().copied().collect(),
        }
    }

    pub fn version(&self) -> u32 {
        SCHEMA_VERSION
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Index of `column` in the fitted layout, matched exactly.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn category_columns(&self) -> &[String] {
        &self.columns[self.categories.clone()]
    }

    pub(crate) fn category_range(&self) -> Range<usize> {
        self.categories.clone()
    }

    pub fn category_vocabulary(&self) -> &'static [&'static str] {
        CATEGORY_VOCABULARY
    }

    pub fn size_table(&self) -> &'static [(&'static str, u8)] {
        SIZE_ORDINALS
    }

    /// Ordinal for `size`, falling back to [`UNKNOWN_SIZE_ORDINAL`] for anything unlisted.
    pub fn size_ordinal(&self, size: &str) -> u8 {
        self.size_ordinals
            .get(size)
            .copied()
            .unwrap_or(UNKNOWN_SIZE_ORDINAL)
    }

    pub fn is_weekend(&self, weekday: Weekday) -> bool {
        WEEKEND_DAYS.contains(&weekday)
    }

    /// Serializable snapshot for the schema endpoint and CLI.
    pub fn view(&self) -> SchemaView {
        SchemaView {
            version: self.version(),
            columns: self.columns.clone(),
            size_ordinals: SIZE_ORDINALS
                .iter()
                .map(|&(size, ordinal)| SizeOrdinalEntry { size, ordinal })
                .collect(),
            unknown_size_ordinal: UNKNOWN_SIZE_ORDINAL,
            weekend_days: WEEKEND_DAYS.iter().map(|day| day.to_string()).collect(),
            category_vocabulary: CATEGORY_VOCABULARY,
            category_choices: CATEGORY_CHOICES,
            size_choices: SIZE_CHOICES,
        }
    }
}

/// Column name for a raw category code. The code is used verbatim.
pub fn category_column(code: &str) -> String {
    format!("{CATEGORY_PREFIX}{code}")
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaView {
    pub version: u32,
    pub columns: Vec<String>,
    pub size_ordinals: Vec<SizeOrdinalEntry>,
    pub unknown_size_ordinal: u8,
    pub weekend_days: Vec<String>,
    pub category_vocabulary: &'static [&'static str],
    pub category_choices: &'static [&'static str],
    pub size_choices: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeOrdinalEntry {
    pub size: &'static str,
    pub ordinal: u8,
}
