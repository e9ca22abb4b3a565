//! Climate vocabularies
//!
//! Maps the two categorical climate columns to and from fixed integer codes.
//! Both vocabularies are ordered from wet to dry by climatic extremity. The
//! order carries no meaning for the classifier, but it must never change
//! between training and inference.

use crate::{Error, Result};

/// Trewartha climate classification codes, wet to dry
pub const TREWARTHA_CODES: &[&str] = &[
    "Ar", "Am", "Aw", "Cf", "Cs", "Cw", "Cr", "Do", "Dc", "Eo", "Ec", "Ft", "Fi", "BW", "BS",
];

/// Broad climate zone descriptions, humid to arid
pub const CLIMATE_ZONES: &[&str] = &[
    "Subtropical Monsoon",
    "Tropical Wet",
    "Tropical Wet-And-Dry",
    "Subtropical Humid",
    "Subtropical Dry",
    "Temperate Continental",
    "Temperate Oceanic",
    "Boreal, Continental Subarctic",
    "Boreal, Maritime Subarctic",
    "Steppe or Semiarid",
    "Tundra",
    "Desert or Arid",
    "Ice Cap",
];

/// Vocabulary for the `Trewartha` column
pub static TREWARTHA: Vocabulary = Vocabulary::new("Trewartha", TREWARTHA_CODES);

/// Vocabulary for the `ClimateZone` column
pub static CLIMATE_ZONE: Vocabulary = Vocabulary::new("ClimateZone", CLIMATE_ZONES);

/// A fixed, ordered list of valid category strings
///
/// Encoding is the position of a category in the list; decoding is the
/// inverse lookup. Unknown categories and out-of-range codes are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    name: &'static str,
    categories: &'static [&'static str],
}

impl Vocabulary {
    pub const fn new(name: &'static str, categories: &'static [&'static str]) -> Self {
        Self { name, categories }
    }

    /// Column name this vocabulary encodes
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &'static [&'static str] {
        self.categories
    }

    /// Encode a single category
    pub fn encode_one(&self, value: &str) -> Result<usize> {
        self.categories
            .iter()
            .position(|category| *category == value)
            .ok_or_else(|| Error::UnknownCategory {
                vocabulary: self.name.to_string(),
                value: value.to_string(),
            })
    }

    /// Decode a single code
    pub fn decode_one(&self, code: usize) -> Result<&'static str> {
        self.categories
            .get(code)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: code,
                len: self.categories.len(),
            })
    }

    /// Encode every value, failing on the first unknown category
    pub fn encode<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<usize>> {
        values.iter().map(|v| self.encode_one(v.as_ref())).collect()
    }

    /// Decode every code, failing on the first out-of-range code
    pub fn decode(&self, codes: &[usize]) -> Result<Vec<&'static str>> {
        codes.iter().map(|&c| self.decode_one(c)).collect()
    }
}
